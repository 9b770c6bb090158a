//! Poll detail page and voting endpoint

use crate::middleware::ClientCtx;
use crate::repository::{Choice, Poll, PollRepository, VoteError};
use crate::tally;
use actix_web::http::header;
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_poll).service(vote_on_poll);
}

/// Public path of a poll's detail page.
pub fn poll_url(poll_id: i32) -> String {
    format!("/poll/{}/", poll_id)
}

/// A choice as rendered on the detail page.
#[derive(Debug)]
pub struct ChoiceView {
    pub id: i32,
    pub text: String,
    pub votes: i32,
    /// Whole-number share of the poll's votes.
    pub percentage: i64,
}

/// Everything the detail page shows about one poll.
#[derive(Debug)]
pub struct PollDetail {
    pub id: i32,
    pub question: String,
    pub choices: Vec<ChoiceView>,
    pub total_votes: i64,
}

impl PollDetail {
    pub fn new(poll: Poll, choices: Vec<Choice>) -> Self {
        let total_votes = tally::total_votes(&choices);
        let choices = choices
            .into_iter()
            .map(|c| ChoiceView {
                id: c.id,
                percentage: tally::rounded_percentage(c.votes as i64, total_votes),
                votes: c.votes,
                text: c.choice,
            })
            .collect();

        Self {
            id: poll.id,
            question: poll.question,
            choices,
            total_votes,
        }
    }

    pub fn has_votes(&self) -> bool {
        self.total_votes > 0
    }

    /// "1 vote" or "N votes".
    pub fn total_caption(&self) -> String {
        tally::pluralize_votes(self.total_votes)
    }
}

#[derive(Template)]
#[template(path = "poll.html")]
pub struct PollTemplate {
    pub client: ClientCtx,
    pub poll: PollDetail,
}

#[get("/poll/{poll_id}/")]
pub async fn view_poll(
    client: ClientCtx,
    repo: web::Data<dyn PollRepository>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let poll_id = path.into_inner();

    let poll = repo
        .get_poll(poll_id)
        .await
        .map_err(|e| {
            log::error!("view_poll: {}", e);
            error::ErrorInternalServerError("Couldn't load poll.")
        })?
        .ok_or_else(|| error::ErrorNotFound("Poll not found."))?;

    let choices = repo.list_choices(poll_id).await.map_err(|e| {
        log::error!("view_poll: {}", e);
        error::ErrorInternalServerError("Couldn't load choices.")
    })?;

    Ok(PollTemplate {
        client,
        poll: PollDetail::new(poll, choices),
    }
    .to_response())
}

#[derive(Deserialize)]
pub struct VoteFormData {
    #[serde(default)]
    pub csrf_token: String,
    /// Id of the selected choice.
    pub vote: i32,
}

/// Adds one vote and redirects back to the poll. Every accepted POST counts.
#[post("/poll/{poll_id}/vote")]
pub async fn vote_on_poll(
    cookies: actix_session::Session,
    repo: web::Data<dyn PollRepository>,
    path: web::Path<i32>,
    form: web::Form<VoteFormData>,
) -> Result<impl Responder, Error> {
    crate::middleware::csrf::validate_csrf_token(&cookies, &form.csrf_token)?;

    let poll_id = path.into_inner();

    let choice = repo
        .record_vote(poll_id, form.vote)
        .await
        .map_err(|e| match e {
            VoteError::PollNotFound => error::ErrorNotFound("Poll not found."),
            VoteError::ChoiceNotFound => error::ErrorNotFound("Choice not found."),
            VoteError::MismatchedChoice => {
                log::debug!(
                    "vote_on_poll: choice {} does not belong to poll {}",
                    form.vote,
                    poll_id
                );
                error::ErrorBadRequest("Mismatched choice for this poll.")
            }
            VoteError::Repo(e) => {
                log::error!("vote_on_poll: {}", e);
                error::ErrorInternalServerError("Couldn't record vote.")
            }
        })?;

    log::debug!(
        "Vote recorded: poll={} choice={} votes={}",
        poll_id,
        choice.id,
        choice.votes
    );

    Ok(HttpResponse::Found()
        .append_header((header::LOCATION, poll_url(poll_id)))
        .finish())
}
