//! In-memory user store.
//!
//! Passwords are compared in plain text; bcrypt hashing is covered by
//! `outbound::persistence::password`.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{LoginCredentials, NewUser, UserId};

struct StoredUser {
    id: UserId,
    email: String,
    password: String,
}

#[derive(Default)]
struct State {
    users: Vec<StoredUser>,
    failure: Option<UserPersistenceError>,
}

/// `UserRepository` double with unique emails and sequential ids.
#[derive(Default)]
pub struct InMemoryUserRepository {
    state: Mutex<State>,
}

impl InMemoryUserRepository {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account directly and return its id.
    pub fn seed(&self, email: &str, password: &str) -> UserId {
        let mut state = self.lock();
        Self::push(&mut state, email, password)
    }

    /// Delete an account, as if removed by an operator.
    pub fn remove(&self, id: UserId) {
        self.lock().users.retain(|user| user.id != id);
    }

    /// Make every subsequent call fail with `error`.
    pub fn fail_with(&self, error: UserPersistenceError) {
        self.lock().failure = Some(error);
    }

    /// Number of registered accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().users.len()
    }

    /// True when no account is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(state: &mut State, email: &str, password: &str) -> UserId {
        let next = state.users.iter().map(|user| user.id.get()).max().unwrap_or(0) + 1;
        let id = UserId::new(next);
        state.users.push(StoredUser {
            id,
            email: email.to_owned(),
            password: password.to_owned(),
        });
        id
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check_failure(state: &State) -> Result<(), UserPersistenceError> {
        state.failure.clone().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &NewUser) -> Result<(), UserPersistenceError> {
        let mut state = self.lock();
        Self::check_failure(&state)?;
        if state.users.iter().any(|stored| stored.email == user.email()) {
            return Err(UserPersistenceError::duplicate_email());
        }
        Self::push(&mut state, user.email(), user.password());
        Ok(())
    }

    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<UserId, UserPersistenceError> {
        let state = self.lock();
        Self::check_failure(&state)?;
        state
            .users
            .iter()
            .find(|user| user.email == credentials.email() && user.password == credentials.password())
            .map(|user| user.id)
            .ok_or_else(UserPersistenceError::invalid_credentials)
    }

    async fn exists(&self, id: UserId) -> Result<bool, UserPersistenceError> {
        let state = self.lock();
        Self::check_failure(&state)?;
        Ok(state.users.iter().any(|user| user.id == id))
    }
}
