//! HTTP inbound adapter serving the HTML pages.

pub mod error;
pub mod forms;
pub mod health;
pub mod page;
pub mod session;
pub mod session_config;
pub mod session_store;
pub mod snippets;
pub mod state;
pub mod templates;
#[cfg(test)]
pub mod test_utils;
pub mod users;

pub use error::HandlerResult;
