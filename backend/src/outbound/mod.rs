//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed snippet and user repositories using
//!   Diesel ORM.
//!
//! Adapters are thin translators between domain types and database rows. They
//! contain no business logic.

pub mod persistence;
