//! In-memory snippet store.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;

use crate::domain::ports::{LATEST_LIMIT, SnippetRepository, SnippetRepositoryError};
use crate::domain::{Snippet, SnippetId};

#[derive(Default)]
struct State {
    rows: Vec<Snippet>,
    next_id: i32,
    failure: Option<SnippetRepositoryError>,
}

/// `SnippetRepository` double with the same expiry rules as the Diesel
/// adapter, evaluated against an injected clock.
pub struct InMemorySnippetRepository {
    state: Mutex<State>,
    clock: Arc<dyn Clock>,
}

impl InMemorySnippetRepository {
    /// Empty store reading time from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1,
                ..State::default()
            }),
            clock,
        }
    }

    /// Store a snippet with explicit timestamps, bypassing `insert`.
    pub fn seed(
        &self,
        title: &str,
        content: &str,
        created: DateTime<Utc>,
        expires: DateTime<Utc>,
    ) -> SnippetId {
        let mut state = self.lock();
        let id = Self::allocate_id(&mut state);
        state.rows.push(Snippet {
            id,
            title: title.to_owned(),
            content: content.to_owned(),
            created,
            expires,
        });
        id
    }

    /// Make every subsequent call fail with `error`.
    pub fn fail_with(&self, error: SnippetRepositoryError) {
        self.lock().failure = Some(error);
    }

    /// Number of stored rows, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    /// True when nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn allocate_id(state: &mut State) -> SnippetId {
        let raw = state.next_id;
        state.next_id += 1;
        match SnippetId::new(raw) {
            Ok(id) => id,
            Err(err) => panic!("in-memory ids start at 1: {err}"),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn check_failure(state: &State) -> Result<(), SnippetRepositoryError> {
        state.failure.clone().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl SnippetRepository for InMemorySnippetRepository {
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_in_days: i32,
    ) -> Result<SnippetId, SnippetRepositoryError> {
        let created = self.clock.utc();
        let mut state = self.lock();
        Self::check_failure(&state)?;
        let id = Self::allocate_id(&mut state);
        state.rows.push(Snippet {
            id,
            title: title.to_owned(),
            content: content.to_owned(),
            created,
            expires: created + Duration::days(i64::from(expires_in_days)),
        });
        Ok(id)
    }

    async fn get(&self, id: SnippetId) -> Result<Snippet, SnippetRepositoryError> {
        let now = self.clock.utc();
        let state = self.lock();
        Self::check_failure(&state)?;
        state
            .rows
            .iter()
            .find(|snippet| snippet.id == id && snippet.is_live_at(now))
            .cloned()
            .ok_or_else(SnippetRepositoryError::no_record)
    }

    async fn latest(&self) -> Result<Vec<Snippet>, SnippetRepositoryError> {
        let now = self.clock.utc();
        let state = self.lock();
        Self::check_failure(&state)?;
        let mut live: Vec<Snippet> = state
            .rows
            .iter()
            .filter(|snippet| snippet.is_live_at(now))
            .cloned()
            .collect();
        live.sort_by(|a, b| b.id.cmp(&a.id));
        live.truncate(LATEST_LIMIT);
        Ok(live)
    }
}
