//! In-memory doubles shared by unit tests (in `src/`) and the HTTP
//! integration tests (in `tests/`).
//!
//! Compiled for `cfg(test)` and behind the `test-support` feature.

mod clock;
mod sessions;
mod snippets;
mod users;

pub use clock::MutableClock;
pub use sessions::InMemorySessionRepository;
pub use snippets::InMemorySnippetRepository;
pub use users::InMemoryUserRepository;
