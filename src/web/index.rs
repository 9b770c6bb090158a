use crate::middleware::ClientCtx;
use crate::repository::{Poll, PollRepository};
use actix_web::{error, get, web, Error, Responder};
use askama_actix::{Template, TemplateToResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_index);
}

/// One row of the home page listing.
#[derive(Debug)]
pub struct PollSummary {
    pub id: i32,
    pub question: String,
}

impl From<Poll> for PollSummary {
    fn from(poll: Poll) -> Self {
        Self {
            id: poll.id,
            question: poll.question,
        }
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub client: ClientCtx,
    pub polls: Vec<PollSummary>,
}

#[get("/")]
pub async fn view_index(
    client: ClientCtx,
    repo: web::Data<dyn PollRepository>,
) -> Result<impl Responder, Error> {
    let polls = repo.list_polls().await.map_err(|e| {
        log::error!("view_index: {}", e);
        error::ErrorInternalServerError("Couldn't load polls.")
    })?;

    Ok(HomeTemplate {
        client,
        polls: polls.into_iter().map(PollSummary::from).collect(),
    }
    .to_response())
}
