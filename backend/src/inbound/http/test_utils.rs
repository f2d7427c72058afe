//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::SessionMiddleware;
use actix_session::config::CookieContentSecurity;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use mockable::DefaultClock;

use super::session_config::SESSION_COOKIE_NAME;
use super::session_store::RepositorySessionStore;
use crate::test_support::InMemorySessionRepository;

/// Build a session middleware configured for tests.
///
/// - Keeps state in a fresh in-memory session store.
/// - Generates a fresh encryption key per invocation.
/// - Uses the production cookie name and disables the `Secure` flag for
///   local HTTP tests.
#[must_use]
pub fn test_session_middleware() -> SessionMiddleware<RepositorySessionStore> {
    let sessions = Arc::new(InMemorySessionRepository::new(Arc::new(DefaultClock)));
    SessionMiddleware::builder(RepositorySessionStore::new(sessions), Key::generate())
        .cookie_name(SESSION_COOKIE_NAME.to_owned())
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_secure(false)
        .build()
}

/// Session cookie set by `res`, if any.
#[must_use]
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(Cookie::into_owned)
}
