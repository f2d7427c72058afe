//! In-memory session store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ports::{SessionRepository, SessionRepositoryError};

struct Entry {
    data: String,
    expiry: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    entries: HashMap<String, Entry>,
    failure: Option<SessionRepositoryError>,
}

/// `SessionRepository` double with the same expiry rules as the Diesel
/// adapter, evaluated against an injected clock.
pub struct InMemorySessionRepository {
    state: Mutex<State>,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionRepository {
    /// Empty store reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(State::default()),
            clock,
        }
    }

    /// Make every subsequent call fail with `error`.
    pub fn fail_with(&self, error: SessionRepositoryError) {
        self.lock().failure = Some(error);
    }

    /// Number of stored sessions, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// True when nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when `token` is stored, live or not.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.lock().entries.contains_key(token)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check_failure(state: &State) -> Result<(), SessionRepositoryError> {
        state.failure.clone().map_or(Ok(()), Err)
    }

    fn live_entry<'a>(
        state: &'a mut State,
        token: &str,
        now: DateTime<Utc>,
    ) -> Option<&'a mut Entry> {
        state
            .entries
            .get_mut(token)
            .filter(|entry| entry.expiry > now)
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn find(&self, token: &str) -> Result<Option<String>, SessionRepositoryError> {
        let now = self.clock.utc();
        let mut state = self.lock();
        Self::check_failure(&state)?;
        Ok(Self::live_entry(&mut state, token, now).map(|entry| entry.data.clone()))
    }

    async fn insert(
        &self,
        token: &str,
        data: &str,
        ttl: TimeDelta,
    ) -> Result<(), SessionRepositoryError> {
        let expiry = self.clock.utc() + ttl;
        let mut state = self.lock();
        Self::check_failure(&state)?;
        state.entries.insert(
            token.to_owned(),
            Entry {
                data: data.to_owned(),
                expiry,
            },
        );
        Ok(())
    }

    async fn update(
        &self,
        token: &str,
        data: &str,
        ttl: TimeDelta,
    ) -> Result<bool, SessionRepositoryError> {
        let now = self.clock.utc();
        let mut state = self.lock();
        Self::check_failure(&state)?;
        Ok(Self::live_entry(&mut state, token, now).is_some_and(|entry| {
            data.clone_into(&mut entry.data);
            entry.expiry = now + ttl;
            true
        }))
    }

    async fn touch(&self, token: &str, ttl: TimeDelta) -> Result<(), SessionRepositoryError> {
        let now = self.clock.utc();
        let mut state = self.lock();
        Self::check_failure(&state)?;
        if let Some(entry) = Self::live_entry(&mut state, token, now) {
            entry.expiry = now + ttl;
        }
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<(), SessionRepositoryError> {
        let mut state = self.lock();
        Self::check_failure(&state)?;
        state.entries.remove(token);
        Ok(())
    }

    async fn delete_expired(&self) -> Result<usize, SessionRepositoryError> {
        let now = self.clock.utc();
        let mut state = self.lock();
        Self::check_failure(&state)?;
        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.expiry > now);
        Ok(before - state.entries.len())
    }
}
