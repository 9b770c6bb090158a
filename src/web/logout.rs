use crate::middleware::client_ctx::{SESSION_ADMIN_ID, SESSION_ADMIN_NAME};
use crate::middleware::ClientCtx;
use actix_web::{get, Responder};
use askama_actix::{Template, TemplateToResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_logout);
}

#[derive(Template)]
#[template(path = "admin/logout.html")]
struct LogoutTemplate {
    client: ClientCtx,
}

#[get("/admin/logout")]
pub async fn view_logout(client: ClientCtx, cookies: actix_session::Session) -> impl Responder {
    if let Some(admin) = client.get_admin() {
        log::info!("Admin logged out: {}", admin.username);
    } else {
        log::debug!("view_logout: no admin session (already logged out?)");
    }

    cookies.remove(SESSION_ADMIN_ID);
    cookies.remove(SESSION_ADMIN_NAME);

    // Fresh context so the page renders as logged out.
    LogoutTemplate {
        client: ClientCtx::from_session(&cookies),
    }
    .to_response()
}
