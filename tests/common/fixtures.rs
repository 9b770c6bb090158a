//! Test fixtures for creating test data

use chrono::{NaiveDate, NaiveDateTime};
use polls::repository::{Choice, NewChoice, NewPoll, Poll, PollRepository, RepoError};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "adm1n";

pub fn first_of_2001() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2001, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub async fn create_poll(repo: &dyn PollRepository, question: &str) -> Result<Poll, RepoError> {
    repo.insert_poll(NewPoll {
        question: question.to_owned(),
        pub_date: first_of_2001(),
    })
    .await
}

pub async fn create_choice(
    repo: &dyn PollRepository,
    poll: &Poll,
    text: &str,
    votes: i32,
) -> Result<Choice, RepoError> {
    repo.insert_choice(NewChoice {
        poll_id: poll.id,
        choice: text.to_owned(),
        votes,
    })
    .await
}

/// "6 times 7" with "42" and "The Ultimate Answer".
pub async fn create_answer_poll(
    repo: &dyn PollRepository,
    votes: (i32, i32),
) -> Result<(Poll, Choice, Choice), RepoError> {
    let poll = create_poll(repo, "6 times 7").await?;
    let first = create_choice(repo, &poll, "42", votes.0).await?;
    let second = create_choice(repo, &poll, "The Ultimate Answer", votes.1).await?;
    Ok((poll, first, second))
}

/// Admin account with known credentials.
pub async fn create_test_admin(repo: &dyn PollRepository) -> Result<i32, anyhow::Error> {
    polls::auth::create_admin(repo, ADMIN_USERNAME, ADMIN_PASSWORD).await
}
