#![allow(dead_code, unused_macros, unused_imports)]

pub mod database;
pub mod fixtures;

/// Builds the application the way `main` does, minus the file server and
/// request logger, around the given `Arc<dyn PollRepository>`.
macro_rules! init_app {
    ($repo:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::from($repo))
                .wrap(
                    actix_web::middleware::ErrorHandlers::new()
                        .handler(
                            actix_web::http::StatusCode::NOT_FOUND,
                            polls::web::error::render_404,
                        )
                        .handler(
                            actix_web::http::StatusCode::BAD_REQUEST,
                            polls::web::error::render_400,
                        ),
                )
                .wrap(polls::middleware::ClientCtx::default())
                .wrap(
                    actix_session::SessionMiddleware::builder(
                        actix_session::storage::CookieSessionStore::default(),
                        actix_web::cookie::Key::generate(),
                    )
                    .cookie_secure(false)
                    .build(),
                )
                .configure(polls::web::configure),
        )
        .await
    };
}
pub(crate) use init_app;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;

/// Name of the cookie written by `actix-session`.
pub const SESSION_COOKIE: &str = "id";

/// Latest session cookie set by a response, if the session changed.
pub fn session_cookie<B>(resp: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.into_owned())
}

/// Pulls the hidden CSRF token out of a rendered form.
pub fn extract_csrf_token(body: &str) -> Option<String> {
    let marker = r#"name="csrf_token" value=""#;
    let start = body.find(marker)? + marker.len();
    let end = body[start..].find('"')? + start;
    Some(body[start..end].to_owned())
}

pub fn location<B>(resp: &ServiceResponse<B>) -> Option<String> {
    resp.headers()
        .get(actix_web::http::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}
