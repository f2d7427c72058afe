//! Server-side session storage for the actix session middleware.
//!
//! The session cookie carries only a random key. State is kept behind the
//! [`SessionRepository`] port as a JSON object, so renewing or ending a
//! session deletes the old key and every captured copy of the cookie stops
//! working.

use std::collections::HashMap;
use std::sync::Arc;

use actix_session::storage::{
    LoadError, SaveError, SessionKey, SessionStore, UpdateError, generate_session_key,
};
use actix_web::cookie::time::Duration;
use chrono::TimeDelta;

use crate::domain::ports::SessionRepository;

type SessionState = HashMap<String, String>;

/// [`SessionStore`] over a [`SessionRepository`].
#[derive(Clone)]
pub struct RepositorySessionStore {
    sessions: Arc<dyn SessionRepository>,
}

impl RepositorySessionStore {
    /// Store sessions in `sessions`.
    #[must_use]
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }

    async fn insert_new(&self, data: &str, ttl: TimeDelta) -> Result<SessionKey, anyhow::Error> {
        let key = generate_session_key();
        self.sessions.insert(key.as_ref(), data, ttl).await?;
        Ok(key)
    }
}

fn ttl_delta(ttl: &Duration) -> TimeDelta {
    TimeDelta::seconds(ttl.whole_seconds())
}

impl SessionStore for RepositorySessionStore {
    async fn load(&self, session_key: &SessionKey) -> Result<Option<SessionState>, LoadError> {
        let Some(data) = self
            .sessions
            .find(session_key.as_ref())
            .await
            .map_err(|err| LoadError::Other(err.into()))?
        else {
            return Ok(None);
        };
        serde_json::from_str(&data)
            .map(Some)
            .map_err(|err| LoadError::Deserialization(err.into()))
    }

    async fn save(
        &self,
        session_state: SessionState,
        ttl: &Duration,
    ) -> Result<SessionKey, SaveError> {
        let data = serde_json::to_string(&session_state)
            .map_err(|err| SaveError::Serialization(err.into()))?;
        self.insert_new(&data, ttl_delta(ttl))
            .await
            .map_err(SaveError::Other)
    }

    async fn update(
        &self,
        session_key: SessionKey,
        session_state: SessionState,
        ttl: &Duration,
    ) -> Result<SessionKey, UpdateError> {
        let data = serde_json::to_string(&session_state)
            .map_err(|err| UpdateError::Serialization(err.into()))?;
        let lifetime = ttl_delta(ttl);
        let updated = self
            .sessions
            .update(session_key.as_ref(), &data, lifetime)
            .await
            .map_err(|err| UpdateError::Other(err.into()))?;
        if updated {
            return Ok(session_key);
        }
        // The session expired or was deleted between load and update.
        self.insert_new(&data, lifetime)
            .await
            .map_err(UpdateError::Other)
    }

    async fn update_ttl(&self, session_key: &SessionKey, ttl: &Duration) -> anyhow::Result<()> {
        Ok(self
            .sessions
            .touch(session_key.as_ref(), ttl_delta(ttl))
            .await?)
    }

    async fn delete(&self, session_key: &SessionKey) -> anyhow::Result<()> {
        Ok(self.sessions.delete(session_key.as_ref()).await?)
    }
}
