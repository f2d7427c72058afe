//! Port abstraction for server-side session storage.
//!
//! The HTTP adapter keeps only a random token in the session cookie; the
//! state itself lives behind this port, so deleting a token revokes every
//! copy of the cookie that carries it.

use async_trait::async_trait;
use chrono::TimeDelta;

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by session repository adapters.
    pub enum SessionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "session repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "session repository query failed: {message}",
    }
}

/// Token-keyed storage for serialised session state.
///
/// Expired sessions are invisible to every operation except
/// [`SessionRepository::delete_expired`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// State stored under `token`, if the session exists and is live.
    async fn find(&self, token: &str) -> Result<Option<String>, SessionRepositoryError>;

    /// Store a new session expiring `ttl` from now.
    async fn insert(
        &self,
        token: &str,
        data: &str,
        ttl: TimeDelta,
    ) -> Result<(), SessionRepositoryError>;

    /// Replace the state of a live session and push back its expiry.
    ///
    /// Returns `false` when no live session matched `token`.
    async fn update(
        &self,
        token: &str,
        data: &str,
        ttl: TimeDelta,
    ) -> Result<bool, SessionRepositoryError>;

    /// Push back the expiry of a live session to `ttl` from now.
    async fn touch(&self, token: &str, ttl: TimeDelta) -> Result<(), SessionRepositoryError>;

    /// Remove the session. Unknown tokens are ignored.
    async fn delete(&self, token: &str) -> Result<(), SessionRepositoryError>;

    /// Remove every expired session and return how many went.
    async fn delete_expired(&self) -> Result<usize, SessionRepositoryError>;
}
