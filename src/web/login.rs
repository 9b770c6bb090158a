use crate::auth::{login, LoginResultStatus};
use crate::middleware::client_ctx::{SESSION_ADMIN_ID, SESSION_ADMIN_NAME};
use crate::middleware::ClientCtx;
use crate::repository::PollRepository;
use actix_web::http::header;
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_login).service(view_login);
}

#[derive(Template)]
#[template(path = "admin/login.html")]
pub struct LoginTemplate {
    pub client: ClientCtx,
}

#[derive(Deserialize)]
pub struct FormData {
    #[serde(default)]
    csrf_token: String,
    username: String,
    password: String,
}

#[post("/admin/login")]
pub async fn post_login(
    cookies: actix_session::Session,
    repo: web::Data<dyn PollRepository>,
    form: web::Form<FormData>,
) -> Result<impl Responder, Error> {
    crate::middleware::csrf::validate_csrf_token(&cookies, &form.csrf_token)?;

    let result = login(repo.get_ref(), &form.username, &form.password)
        .await
        .map_err(|e| {
            log::error!("error {:?}", e);
            error::ErrorInternalServerError("DB error")
        })?;

    let (user_id, username) = match (result.result, result.user_id, result.username) {
        (LoginResultStatus::Success, Some(user_id), Some(username)) => (user_id, username),
        (status, _, _) => {
            log::debug!("login failure: {:?} for {}", status, form.username);
            // Use generic message to avoid username enumeration
            return Err(error::ErrorUnauthorized("Invalid username or password."));
        }
    };

    cookies
        .insert(SESSION_ADMIN_ID, user_id)
        .map_err(|_| error::ErrorInternalServerError("middleware error"))?;
    cookies
        .insert(SESSION_ADMIN_NAME, username.clone())
        .map_err(|_| error::ErrorInternalServerError("middleware error"))?;

    log::info!("Admin logged in: {}", username);

    Ok(HttpResponse::Found()
        .append_header((header::LOCATION, "/admin/"))
        .finish())
}

#[get("/admin/login")]
pub async fn view_login(client: ClientCtx) -> impl Responder {
    if client.is_admin() {
        return HttpResponse::Found()
            .append_header((header::LOCATION, "/admin/"))
            .finish();
    }

    LoginTemplate { client }.to_response()
}
