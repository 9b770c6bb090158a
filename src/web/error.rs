//! Error pages rendered by the `ErrorHandlers` middleware.

use actix_web::dev::ServiceResponse;
use actix_web::http::header::{self, HeaderValue};
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::Result;
use askama_actix::Template;

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    status: u16,
    title: &'a str,
    message: String,
}

pub fn render_400<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render_error(res, "Bad Request")
}

pub fn render_404<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render_error(res, "Not Found")
}

pub fn render_500<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render_error(res, "Internal Server Error")
}

/// Replaces the body with the error page, keeping status and headers.
fn render_error<B>(res: ServiceResponse<B>, title: &str) -> Result<ErrorHandlerResponse<B>> {
    let status = res.status();
    let message = res
        .response()
        .error()
        .map(|e| e.to_string())
        .unwrap_or_else(|| title.to_owned());

    let body = ErrorTemplate {
        status: status.as_u16(),
        title,
        message,
    }
    .render()
    .unwrap_or_else(|e| {
        log::error!("render_error: {}", e);
        title.to_owned()
    });

    let (req, res) = res.into_parts();
    let res = res.set_body(body);
    let mut res = ServiceResponse::new(req, res)
        .map_into_boxed_body()
        .map_into_right_body();
    res.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );

    Ok(ErrorHandlerResponse::Response(res))
}
