//! Request middleware.
//!
//! Cross-cutting request lifecycle concerns: panic recovery, request
//! logging, security headers, CSRF protection and authentication.

pub mod auth;
pub mod csrf;
pub mod headers;
pub mod recover;
pub mod trace;

pub use auth::{Authenticate, AuthenticatedUser, RequireAuthentication};
pub use csrf::{CsrfProtection, CsrfToken};
pub use headers::common_headers;
pub use recover::RecoverPanic;
pub use trace::Trace;
