//! Snippetbox library modules.
//!
//! The binary in `main.rs` wires these together; integration tests build the
//! same application with the in-memory doubles from `test_support`.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use middleware::Trace;
