//! Domain primitives and ports.
//!
//! Purpose: define the strongly typed snippet and user entities, the form
//! validator, and the persistence ports the HTTP adapter drives. Nothing in
//! this module knows about actix, diesel, or tera.
//!
//! Public surface:
//! - Error (alias to `error::DomainError`) - transport agnostic failure.
//! - Snippet / SnippetId - stored, expiring text.
//! - UserId / NewUser / LoginCredentials - account primitives.
//! - Validator - field and non-field error accumulator for forms.

pub mod error;
pub mod ports;
pub mod snippet;
pub mod user;
pub mod validator;

pub use self::error::{DomainError as Error, DomainErrorValidationError, ErrorCode};
pub use self::snippet::{
    CONTENT_MAX_CHARS, PERMITTED_EXPIRY_DAYS, Snippet, SnippetId, SnippetIdError, TITLE_MAX_CHARS,
};
pub use self::user::{LoginCredentials, NewUser, PASSWORD_MIN_CHARS, UserId};
pub use self::validator::{Validator, email_regex};
