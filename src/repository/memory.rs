use super::{
    check_votes, AdminUser, Choice, NewChoice, NewPoll, Poll, PollRepository, RepoError,
    VoteError,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Store {
    polls: BTreeMap<i32, Poll>,
    choices: BTreeMap<i32, Choice>,
    admins: BTreeMap<i32, AdminUser>,
    last_poll_id: i32,
    last_choice_id: i32,
    last_admin_id: i32,
}

/// Process-local repository. Ids are assigned sequentially from 1 and
/// `BTreeMap` ordering gives the same insertion order the database does.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    store: RwLock<Store>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Store>, RepoError> {
        self.store.read().map_err(|_| RepoError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Store>, RepoError> {
        self.store.write().map_err(|_| RepoError::Poisoned)
    }
}

#[async_trait]
impl PollRepository for MemoryRepository {
    async fn list_polls(&self) -> Result<Vec<Poll>, RepoError> {
        Ok(self.read()?.polls.values().cloned().collect())
    }

    async fn get_poll(&self, id: i32) -> Result<Option<Poll>, RepoError> {
        Ok(self.read()?.polls.get(&id).cloned())
    }

    async fn insert_poll(&self, poll: NewPoll) -> Result<Poll, RepoError> {
        let mut store = self.write()?;
        store.last_poll_id += 1;
        let poll = Poll {
            id: store.last_poll_id,
            question: poll.question,
            pub_date: poll.pub_date,
        };
        store.polls.insert(poll.id, poll.clone());
        Ok(poll)
    }

    async fn save_poll(&self, poll: &Poll) -> Result<(), RepoError> {
        let mut store = self.write()?;
        let existing = store.polls.get_mut(&poll.id).ok_or(RepoError::NotFound)?;
        existing.question = poll.question.clone();
        existing.pub_date = poll.pub_date;
        Ok(())
    }

    async fn insert_poll_with_choices(
        &self,
        poll: NewPoll,
        labels: Vec<String>,
    ) -> Result<(Poll, Vec<Choice>), RepoError> {
        let mut store = self.write()?;

        store.last_poll_id += 1;
        let poll = Poll {
            id: store.last_poll_id,
            question: poll.question,
            pub_date: poll.pub_date,
        };
        store.polls.insert(poll.id, poll.clone());

        let mut saved = Vec::with_capacity(labels.len());
        for text in labels {
            store.last_choice_id += 1;
            let choice = Choice {
                id: store.last_choice_id,
                poll_id: poll.id,
                choice: text,
                votes: 0,
            };
            store.choices.insert(choice.id, choice.clone());
            saved.push(choice);
        }

        Ok((poll, saved))
    }

    async fn delete_poll(&self, id: i32) -> Result<bool, RepoError> {
        let mut store = self.write()?;
        if store.polls.remove(&id).is_none() {
            return Ok(false);
        }
        store.choices.retain(|_, choice| choice.poll_id != id);
        Ok(true)
    }

    async fn list_choices(&self, poll_id: i32) -> Result<Vec<Choice>, RepoError> {
        Ok(self
            .read()?
            .choices
            .values()
            .filter(|choice| choice.poll_id == poll_id)
            .cloned()
            .collect())
    }

    async fn get_choice(&self, id: i32) -> Result<Option<Choice>, RepoError> {
        Ok(self.read()?.choices.get(&id).cloned())
    }

    async fn insert_choice(&self, choice: NewChoice) -> Result<Choice, RepoError> {
        check_votes(choice.votes)?;
        let mut store = self.write()?;
        if !store.polls.contains_key(&choice.poll_id) {
            return Err(RepoError::NotFound);
        }
        store.last_choice_id += 1;
        let choice = Choice {
            id: store.last_choice_id,
            poll_id: choice.poll_id,
            choice: choice.choice,
            votes: choice.votes,
        };
        store.choices.insert(choice.id, choice.clone());
        Ok(choice)
    }

    async fn save_choice(&self, choice: &Choice) -> Result<(), RepoError> {
        check_votes(choice.votes)?;
        let mut store = self.write()?;
        let existing = store
            .choices
            .get_mut(&choice.id)
            .ok_or(RepoError::NotFound)?;
        existing.choice = choice.choice.clone();
        existing.votes = choice.votes;
        Ok(())
    }

    async fn record_vote(&self, poll_id: i32, choice_id: i32) -> Result<Choice, VoteError> {
        let mut store = self.write()?;
        if !store.polls.contains_key(&poll_id) {
            return Err(VoteError::PollNotFound);
        }

        let choice = store
            .choices
            .get_mut(&choice_id)
            .ok_or(VoteError::ChoiceNotFound)?;
        if choice.poll_id != poll_id {
            return Err(VoteError::MismatchedChoice);
        }

        choice.votes += 1;
        Ok(choice.clone())
    }

    async fn get_admin_by_name(&self, username: &str) -> Result<Option<AdminUser>, RepoError> {
        Ok(self
            .read()?
            .admins
            .values()
            .find(|admin| admin.username == username)
            .cloned())
    }

    async fn save_admin(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<AdminUser, RepoError> {
        let mut store = self.write()?;
        if let Some(admin) = store
            .admins
            .values_mut()
            .find(|admin| admin.username == username)
        {
            admin.password_hash = password_hash.to_owned();
            return Ok(admin.clone());
        }

        store.last_admin_id += 1;
        let admin = AdminUser {
            id: store.last_admin_id,
            username: username.to_owned(),
            password_hash: password_hash.to_owned(),
        };
        store.admins.insert(admin.id, admin.clone());
        Ok(admin)
    }
}
