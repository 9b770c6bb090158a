/// Administration of polls and their choices
///
/// Every route here requires an admin session; visitors are redirected to
/// `/admin/login`. Forms post back with the session CSRF token.
use crate::middleware::ClientCtx;
use crate::repository::{NewPoll, PollRepository, RepoError};
use crate::tally;
use actix_web::http::header;
use actix_web::{error, get, post, web, Error, HttpResponse, Responder};
use askama_actix::{Template, TemplateToResponse};
use chrono::{NaiveDateTime, Utc};
use validator::Validate;

/// `<input type="datetime-local">` format, also accepted with seconds.
const PUB_DATE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_dashboard)
        .service(view_new_poll_form)
        .service(create_poll)
        .service(delete_poll);
}

/// Poll row on the admin dashboard.
#[derive(Debug)]
pub struct AdminPollRow {
    pub id: i32,
    pub question: String,
    pub pub_date: String,
    pub choice_count: usize,
    pub total_votes: String,
}

#[get("/admin/")]
pub async fn view_dashboard(
    client: ClientCtx,
    repo: web::Data<dyn PollRepository>,
) -> Result<impl Responder, Error> {
    #[derive(Template)]
    #[template(path = "admin/index.html")]
    pub struct DashboardTemplate {
        pub client: ClientCtx,
        pub polls: Vec<AdminPollRow>,
    }

    client.require_admin()?;

    let polls = repo.list_polls().await.map_err(|e| {
        log::error!("view_dashboard: {}", e);
        error::ErrorInternalServerError("Couldn't load polls.")
    })?;

    let mut rows = Vec::with_capacity(polls.len());
    for poll in polls {
        let choices = repo.list_choices(poll.id).await.map_err(|e| {
            log::error!("view_dashboard: {}", e);
            error::ErrorInternalServerError("Couldn't load choices.")
        })?;
        rows.push(AdminPollRow {
            id: poll.id,
            question: poll.question,
            pub_date: poll.pub_date.format("%Y-%m-%d %H:%M").to_string(),
            choice_count: choices.len(),
            total_votes: tally::pluralize_votes(tally::total_votes(&choices)),
        });
    }

    Ok(DashboardTemplate {
        client,
        polls: rows,
    }
    .to_response())
}

#[derive(Template)]
#[template(path = "admin/poll_form.html")]
pub struct PollFormTemplate {
    pub client: ClientCtx,
    pub default_pub_date: String,
    pub slots: Vec<usize>,
}

#[get("/admin/polls/new")]
pub async fn view_new_poll_form(client: ClientCtx) -> Result<impl Responder, Error> {
    client.require_admin()?;

    Ok(PollFormTemplate {
        client,
        default_pub_date: Utc::now().naive_utc().format(PUB_DATE_FORMATS[0]).to_string(),
        slots: (0..crate::app_config::admin().slots).collect(),
    }
    .to_response())
}

/// Submitted "Add poll" form. Choice inputs are named `choice_0`, `choice_1`, ...
#[derive(Debug, Default, Validate)]
pub struct PollForm {
    pub csrf_token: String,
    #[validate(length(min = 1, max = 200, message = "Question must be 1 to 200 characters."))]
    pub question: String,
    pub pub_date: String,
    pub choices: Vec<String>,
}

impl PollForm {
    /// Collects the url-encoded pairs. Choice slots keep their numeric order
    /// and blank slots are dropped.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = PollForm::default();
        let mut choices: Vec<(usize, String)> = Vec::new();

        for (key, value) in pairs {
            match key.as_str() {
                "csrf_token" => form.csrf_token = value,
                "question" => form.question = value.trim().to_owned(),
                "pub_date" => form.pub_date = value.trim().to_owned(),
                _ => {
                    if let Some(slot) = key
                        .strip_prefix("choice_")
                        .and_then(|n| n.parse::<usize>().ok())
                    {
                        let text = value.trim();
                        if !text.is_empty() {
                            choices.push((slot, text.to_owned()));
                        }
                    }
                }
            }
        }

        choices.sort_by_key(|(slot, _)| *slot);
        form.choices = choices.into_iter().map(|(_, text)| text).collect();
        form
    }

    /// Empty means "now".
    pub fn parse_pub_date(&self) -> Result<NaiveDateTime, String> {
        if self.pub_date.is_empty() {
            return Ok(Utc::now().naive_utc());
        }
        PUB_DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(&self.pub_date, fmt).ok())
            .ok_or_else(|| format!("Invalid publication date: {}", self.pub_date))
    }
}

#[post("/admin/polls/new")]
pub async fn create_poll(
    client: ClientCtx,
    cookies: actix_session::Session,
    repo: web::Data<dyn PollRepository>,
    pairs: web::Form<Vec<(String, String)>>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;

    let form = PollForm::from_pairs(pairs.into_inner());
    crate::middleware::csrf::validate_csrf_token(&cookies, &form.csrf_token)?;

    if let Err(e) = form.validate() {
        log::debug!("create_poll: invalid form {:?}", e);
        return Err(error::ErrorBadRequest("Question must be 1 to 200 characters."));
    }
    let pub_date = form.parse_pub_date().map_err(error::ErrorBadRequest)?;

    let (poll, choices) = repo
        .insert_poll_with_choices(
            NewPoll {
                question: form.question.clone(),
                pub_date,
            },
            form.choices.clone(),
        )
        .await
        .map_err(|e| {
            log::error!("Failed to create poll: {}", e);
            error::ErrorInternalServerError("Failed to create poll")
        })?;

    log::info!(
        "Poll {} created by {} with {} choices",
        poll.id,
        client.get_name(),
        choices.len()
    );

    Ok(HttpResponse::Found()
        .append_header((header::LOCATION, "/admin/"))
        .finish())
}

#[derive(serde::Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub csrf_token: String,
}

#[post("/admin/polls/{poll_id}/delete")]
pub async fn delete_poll(
    client: ClientCtx,
    cookies: actix_session::Session,
    repo: web::Data<dyn PollRepository>,
    path: web::Path<i32>,
    form: web::Form<DeleteForm>,
) -> Result<impl Responder, Error> {
    client.require_admin()?;
    crate::middleware::csrf::validate_csrf_token(&cookies, &form.csrf_token)?;

    let poll_id = path.into_inner();
    match repo.delete_poll(poll_id).await {
        Ok(true) => {
            log::info!("Poll {} deleted by {}", poll_id, client.get_name());
            Ok(HttpResponse::Found()
                .append_header((header::LOCATION, "/admin/"))
                .finish())
        }
        Ok(false) | Err(RepoError::NotFound) => Err(error::ErrorNotFound("Poll not found.")),
        Err(e) => {
            log::error!("Failed to delete poll {}: {}", poll_id, e);
            Err(error::ErrorInternalServerError("Failed to delete poll"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_form_keeps_slot_order_and_skips_blanks() {
        let form = PollForm::from_pairs(pairs(&[
            ("csrf_token", "abc"),
            ("question", "  Which workshop treat do you prefer?  "),
            ("choice_2", "The Acquisition of Knowledge"),
            ("choice_0", "Beer"),
            ("choice_1", "   "),
            ("choice_x", "ignored"),
        ]));

        assert_eq!(form.csrf_token, "abc");
        assert_eq!(form.question, "Which workshop treat do you prefer?");
        assert_eq!(form.choices, vec!["Beer", "The Acquisition of Knowledge"]);
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_question_length_limits() {
        let blank = PollForm::from_pairs(pairs(&[("question", "   ")]));
        assert!(blank.validate().is_err());

        let long = "x".repeat(201);
        let too_long = PollForm::from_pairs(pairs(&[("question", long.as_str())]));
        assert!(too_long.validate().is_err());

        let max = "x".repeat(200);
        let at_limit = PollForm::from_pairs(pairs(&[("question", max.as_str())]));
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_pub_date_formats() {
        let form = PollForm::from_pairs(pairs(&[("pub_date", "2012-12-25T10:30")]));
        let date = form.parse_pub_date().unwrap();
        assert_eq!(date.format("%Y-%m-%d %H:%M").to_string(), "2012-12-25 10:30");

        let form = PollForm::from_pairs(pairs(&[("pub_date", "2012-12-25 10:30:15")]));
        assert!(form.parse_pub_date().is_ok());

        let form = PollForm::from_pairs(pairs(&[("pub_date", "Christmas")]));
        assert!(form.parse_pub_date().is_err());

        let form = PollForm::from_pairs(pairs(&[]));
        assert!(form.parse_pub_date().is_ok());
    }
}
