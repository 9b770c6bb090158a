use super::{
    check_votes, AdminUser, Choice, NewChoice, NewPoll, Poll, PollRepository, RepoError,
    VoteError,
};
use crate::orm::{admin_users, choices, polls};
use async_trait::async_trait;
use sea_orm::{entity::*, query::*, sea_query::Expr, DatabaseConnection, TransactionTrait};

/// SeaORM backed repository. Works with any backend sea-orm was built with.
#[derive(Clone, Debug)]
pub struct DbRepository {
    db: DatabaseConnection,
}

impl DbRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl From<polls::Model> for Poll {
    fn from(model: polls::Model) -> Self {
        Self {
            id: model.id,
            question: model.question,
            pub_date: model.pub_date,
        }
    }
}

impl From<choices::Model> for Choice {
    fn from(model: choices::Model) -> Self {
        Self {
            id: model.id,
            poll_id: model.poll_id,
            choice: model.choice,
            votes: model.votes,
        }
    }
}

impl From<admin_users::Model> for AdminUser {
    fn from(model: admin_users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            password_hash: model.password,
        }
    }
}

#[async_trait]
impl PollRepository for DbRepository {
    async fn list_polls(&self) -> Result<Vec<Poll>, RepoError> {
        let polls = polls::Entity::find()
            .order_by_asc(polls::Column::Id)
            .all(&self.db)
            .await?;
        Ok(polls.into_iter().map(Poll::from).collect())
    }

    async fn get_poll(&self, id: i32) -> Result<Option<Poll>, RepoError> {
        Ok(polls::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Poll::from))
    }

    async fn insert_poll(&self, poll: NewPoll) -> Result<Poll, RepoError> {
        let model = polls::ActiveModel {
            question: Set(poll.question),
            pub_date: Set(poll.pub_date),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(model.into())
    }

    async fn save_poll(&self, poll: &Poll) -> Result<(), RepoError> {
        let res = polls::Entity::update_many()
            .col_expr(polls::Column::Question, Expr::value(poll.question.clone()))
            .col_expr(polls::Column::PubDate, Expr::value(poll.pub_date))
            .filter(polls::Column::Id.eq(poll.id))
            .exec(&self.db)
            .await?;

        if res.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn insert_poll_with_choices(
        &self,
        poll: NewPoll,
        labels: Vec<String>,
    ) -> Result<(Poll, Vec<Choice>), RepoError> {
        // Dropping the transaction on an early return rolls it back.
        let txn = self.db.begin().await?;

        let poll = polls::ActiveModel {
            question: Set(poll.question),
            pub_date: Set(poll.pub_date),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut saved = Vec::with_capacity(labels.len());
        for text in labels {
            let choice = choices::ActiveModel {
                poll_id: Set(poll.id),
                choice: Set(text),
                votes: Set(0),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            saved.push(Choice::from(choice));
        }

        txn.commit().await?;
        Ok((poll.into(), saved))
    }

    async fn delete_poll(&self, id: i32) -> Result<bool, RepoError> {
        // Choices go first so the result does not depend on the backend
        // enforcing ON DELETE CASCADE.
        let txn = self.db.begin().await?;

        choices::Entity::delete_many()
            .filter(choices::Column::PollId.eq(id))
            .exec(&txn)
            .await?;

        let res = polls::Entity::delete_many()
            .filter(polls::Column::Id.eq(id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(res.rows_affected > 0)
    }

    async fn list_choices(&self, poll_id: i32) -> Result<Vec<Choice>, RepoError> {
        let choices = choices::Entity::find()
            .filter(choices::Column::PollId.eq(poll_id))
            .order_by_asc(choices::Column::Id)
            .all(&self.db)
            .await?;
        Ok(choices.into_iter().map(Choice::from).collect())
    }

    async fn get_choice(&self, id: i32) -> Result<Option<Choice>, RepoError> {
        Ok(choices::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Choice::from))
    }

    async fn insert_choice(&self, choice: NewChoice) -> Result<Choice, RepoError> {
        check_votes(choice.votes)?;
        if self.get_poll(choice.poll_id).await?.is_none() {
            return Err(RepoError::NotFound);
        }

        let model = choices::ActiveModel {
            poll_id: Set(choice.poll_id),
            choice: Set(choice.choice),
            votes: Set(choice.votes),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;
        Ok(model.into())
    }

    async fn save_choice(&self, choice: &Choice) -> Result<(), RepoError> {
        check_votes(choice.votes)?;
        let res = choices::Entity::update_many()
            .col_expr(choices::Column::Choice, Expr::value(choice.choice.clone()))
            .col_expr(choices::Column::Votes, Expr::value(choice.votes))
            .filter(choices::Column::Id.eq(choice.id))
            .exec(&self.db)
            .await?;

        if res.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn record_vote(&self, poll_id: i32, choice_id: i32) -> Result<Choice, VoteError> {
        if self.get_poll(poll_id).await?.is_none() {
            return Err(VoteError::PollNotFound);
        }

        let choice = self
            .get_choice(choice_id)
            .await?
            .ok_or(VoteError::ChoiceNotFound)?;

        if choice.poll_id != poll_id {
            return Err(VoteError::MismatchedChoice);
        }

        // Single statement so concurrent votes cannot overwrite each other.
        let res = choices::Entity::update_many()
            .col_expr(
                choices::Column::Votes,
                Expr::col(choices::Column::Votes).add(1),
            )
            .filter(choices::Column::Id.eq(choice_id))
            .filter(choices::Column::PollId.eq(poll_id))
            .exec(&self.db)
            .await?;

        if res.rows_affected == 0 {
            // Deleted between the lookup and the update.
            return Err(VoteError::ChoiceNotFound);
        }

        self.get_choice(choice_id)
            .await?
            .ok_or(VoteError::ChoiceNotFound)
    }

    async fn get_admin_by_name(&self, username: &str) -> Result<Option<AdminUser>, RepoError> {
        Ok(admin_users::Entity::find()
            .filter(admin_users::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .map(AdminUser::from))
    }

    async fn save_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AdminUser, RepoError> {
        let existing = admin_users::Entity::find()
            .filter(admin_users::Column::Username.eq(username))
            .one(&self.db)
            .await?;

        let model = match existing {
            Some(user) => {
                let mut active: admin_users::ActiveModel = user.into();
                active.password = Set(password_hash.to_owned());
                active.update(&self.db).await?
            }
            None => {
                admin_users::ActiveModel {
                    username: Set(username.to_owned()),
                    password: Set(password_hash.to_owned()),
                    created_at: Set(chrono::Utc::now().naive_utc()),
                    ..Default::default()
                }
                .insert(&self.db)
                .await?
            }
        };

        Ok(model.into())
    }
}
