//! Port abstraction for snippet persistence adapters and their errors.

use async_trait::async_trait;

use crate::domain::{Snippet, SnippetId};

use super::define_port_error;

/// Maximum number of snippets returned by [`SnippetRepository::latest`].
pub const LATEST_LIMIT: usize = 10;

define_port_error! {
    /// Persistence errors raised by snippet repository adapters.
    pub enum SnippetRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "snippet repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "snippet repository query failed: {message}",
        /// No live snippet matched the requested id.
        NoRecord => "no matching record found",
    }
}

/// Storage for expiring snippets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnippetRepository: Send + Sync {
    /// Store a snippet created now and expiring `expires_in_days` from now.
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_in_days: i32,
    ) -> Result<SnippetId, SnippetRepositoryError>;

    /// Fetch a snippet that has not yet expired.
    ///
    /// Missing and expired ids both yield [`SnippetRepositoryError::NoRecord`].
    async fn get(&self, id: SnippetId) -> Result<Snippet, SnippetRepositoryError>;

    /// Up to [`LATEST_LIMIT`] live snippets, newest id first.
    async fn latest(&self) -> Result<Vec<Snippet>, SnippetRepositoryError>;
}
