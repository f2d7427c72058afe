//! Domain ports defining the edges of the hexagon.
//!
//! Handlers and the session middleware talk to storage only through these
//! traits. Each trait exposes a strongly typed error so adapters map their
//! failures into predictable variants, and each has an in-memory double for
//! HTTP tests.

mod macros;
pub(crate) use macros::define_port_error;

mod session_repository;
mod snippet_repository;
mod user_repository;

#[cfg(test)]
pub use session_repository::MockSessionRepository;
pub use session_repository::{SessionRepository, SessionRepositoryError};
#[cfg(test)]
pub use snippet_repository::MockSnippetRepository;
pub use snippet_repository::{LATEST_LIMIT, SnippetRepository, SnippetRepositoryError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
