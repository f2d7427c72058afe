//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the snippet, user and session ports backed by
//! PostgreSQL via `diesel-async` and a `bb8` pool.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: driver failures become port error variants.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use snippetbox::outbound::persistence::{DbPool, DieselSnippetRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/snippetbox")).await?;
//! let snippets = DieselSnippetRepository::new(pool, Arc::new(mockable::DefaultClock));
//! ```

mod diesel_error_mapping;
mod diesel_session_repository;
mod diesel_snippet_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod password;
mod pool;
mod schema;

pub use diesel_session_repository::DieselSessionRepository;
pub use diesel_snippet_repository::DieselSnippetRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
