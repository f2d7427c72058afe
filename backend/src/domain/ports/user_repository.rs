//! Port abstraction for user account persistence.
use async_trait::async_trait;

use crate::domain::{LoginCredentials, NewUser, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another account already uses the email address.
        DuplicateEmail => "duplicate email",
        /// Unknown email or wrong password.
        InvalidCredentials => "invalid credentials",
    }
}

/// Storage and authentication of user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Hash the password and store a new account.
    async fn insert(&self, user: &NewUser) -> Result<(), UserPersistenceError>;

    /// Resolve credentials to the matching user id.
    async fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<UserId, UserPersistenceError>;

    /// Whether an account with `id` still exists.
    async fn exists(&self, id: UserId) -> Result<bool, UserPersistenceError>;
}
