//! Data access for polls, choices and admin accounts.
//!
//! Handlers never touch the ORM directly. They receive a
//! `web::Data<dyn PollRepository>` and work with the plain records defined
//! here, which keeps the entities free of persistence concerns and lets the
//! same handlers run against a database or the in-memory store.

mod memory;
mod sql;

pub use memory::MemoryRepository;
pub use sql::DbRepository;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use derive_more::Display;
use sea_orm::DbErr;

/// A question with a publication timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Poll {
    pub id: i32,
    pub question: String,
    /// Informational only. Polls are listed regardless of this value.
    pub pub_date: NaiveDateTime,
}

/// A selectable answer belonging to exactly one poll.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Choice {
    pub id: i32,
    pub poll_id: i32,
    pub choice: String,
    pub votes: i32,
}

impl Choice {
    /// Share of `total_votes` held by this choice, 0 when nobody voted.
    pub fn percentage(&self, total_votes: i64) -> f64 {
        crate::tally::percentage(self.votes as i64, total_votes)
    }
}

/// Poll awaiting its first save.
#[derive(Clone, Debug)]
pub struct NewPoll {
    pub question: String,
    pub pub_date: NaiveDateTime,
}

/// Choice awaiting its first save.
#[derive(Clone, Debug)]
pub struct NewChoice {
    pub poll_id: i32,
    pub choice: String,
    pub votes: i32,
}

impl NewChoice {
    /// A choice with no votes yet.
    pub fn new<S: Into<String>>(poll_id: i32, choice: S) -> Self {
        Self {
            poll_id,
            choice: choice.into(),
            votes: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdminUser {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Display)]
pub enum RepoError {
    #[display(fmt = "database error: {}", _0)]
    Database(DbErr),
    #[display(fmt = "record not found")]
    NotFound,
    #[display(fmt = "in-memory store is poisoned")]
    Poisoned,
    /// Vote counts are never negative.
    #[display(fmt = "invalid vote count: {}", _0)]
    InvalidVotes(i32),
}

/// Rejects a negative vote count before it reaches storage.
pub(crate) fn check_votes(votes: i32) -> Result<(), RepoError> {
    if votes < 0 {
        return Err(RepoError::InvalidVotes(votes));
    }
    Ok(())
}

impl std::error::Error for RepoError {}

impl From<DbErr> for RepoError {
    fn from(err: DbErr) -> Self {
        RepoError::Database(err)
    }
}

/// Reasons a vote can be refused.
#[derive(Debug, Display)]
pub enum VoteError {
    #[display(fmt = "poll not found")]
    PollNotFound,
    #[display(fmt = "choice not found")]
    ChoiceNotFound,
    /// The submitted choice exists but belongs to another poll.
    #[display(fmt = "mismatched choice")]
    MismatchedChoice,
    #[display(fmt = "{}", _0)]
    Repo(RepoError),
}

impl std::error::Error for VoteError {}

impl From<RepoError> for VoteError {
    fn from(err: RepoError) -> Self {
        VoteError::Repo(err)
    }
}

impl From<DbErr> for VoteError {
    fn from(err: DbErr) -> Self {
        VoteError::Repo(RepoError::Database(err))
    }
}

#[async_trait]
pub trait PollRepository: Send + Sync {
    /// Every poll in insertion order.
    async fn list_polls(&self) -> Result<Vec<Poll>, RepoError>;

    async fn get_poll(&self, id: i32) -> Result<Option<Poll>, RepoError>;

    async fn insert_poll(&self, poll: NewPoll) -> Result<Poll, RepoError>;

    /// Overwrites question and publication date. `NotFound` if absent.
    async fn save_poll(&self, poll: &Poll) -> Result<(), RepoError>;

    /// Saves a poll and one zero-vote choice per label, all or nothing.
    async fn insert_poll_with_choices(
        &self,
        poll: NewPoll,
        labels: Vec<String>,
    ) -> Result<(Poll, Vec<Choice>), RepoError>;

    /// Deletes a poll along with its choices. Returns false if it did not exist.
    async fn delete_poll(&self, id: i32) -> Result<bool, RepoError>;

    /// Choices of one poll in insertion order.
    async fn list_choices(&self, poll_id: i32) -> Result<Vec<Choice>, RepoError>;

    async fn get_choice(&self, id: i32) -> Result<Option<Choice>, RepoError>;

    /// `NotFound` when the owning poll does not exist, `InvalidVotes` for a
    /// negative count.
    async fn insert_choice(&self, choice: NewChoice) -> Result<Choice, RepoError>;

    /// Overwrites label and vote count. `NotFound` if absent, `InvalidVotes`
    /// for a negative count.
    async fn save_choice(&self, choice: &Choice) -> Result<(), RepoError>;

    /// Adds exactly one vote to `choice_id`, which must belong to `poll_id`.
    /// The increment is atomic with respect to concurrent voters.
    async fn record_vote(&self, poll_id: i32, choice_id: i32) -> Result<Choice, VoteError>;

    async fn get_admin_by_name(&self, username: &str) -> Result<Option<AdminUser>, RepoError>;

    /// Creates the account, or replaces its password if the name is taken.
    async fn save_admin(&self, username: &str, password_hash: &str)
        -> Result<AdminUser, RepoError>;
}
