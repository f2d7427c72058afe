//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Wraps the actix session so handlers deal in domain operations: logging a
//! user in or out, and carrying one-shot flash messages to the next page.

use actix_session::{Session, SessionExt};
use actix_web::dev::{Payload, ServiceRequest};
use actix_web::{FromRequest, HttpRequest};
use futures_util::future::{Ready, ready};
use tracing::warn;

use crate::domain::{Error, UserId};

pub(crate) const USER_ID_KEY: &str = "authenticated_user_id";
pub(crate) const FLASH_KEY: &str = "flash";
pub(crate) const CSRF_TOKEN_KEY: &str = "csrf_token";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

fn session_error(action: &str, error: impl std::fmt::Display) -> Error {
    Error::internal(format!("failed to {action} session: {error}"))
}

impl SessionContext {
    /// Construct a new wrapper from the underlying actix session.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Session attached to a request inside the session middleware.
    #[must_use]
    pub fn from_service_request(req: &ServiceRequest) -> Self {
        Self(req.get_session())
    }

    /// Id stored at login, if any. A malformed value is treated as absent.
    #[must_use]
    pub fn authenticated_user_id(&self) -> Option<UserId> {
        match self.0.get::<i32>(USER_ID_KEY) {
            Ok(id) => id.map(UserId::new),
            Err(error) => {
                warn!(%error, "unreadable user id in session cookie");
                None
            }
        }
    }

    /// Start an authenticated session.
    ///
    /// The session is renewed first so a pre-login cookie cannot be replayed.
    pub fn log_in(&self, user_id: UserId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user_id.get())
            .map_err(|error| session_error("persist", error))
    }

    /// End the authenticated session, keeping the session itself alive for
    /// the flash message.
    pub fn log_out(&self) {
        self.0.renew();
        self.0.remove(USER_ID_KEY);
    }

    /// Queue a message for the next rendered page.
    pub fn put_flash(&self, message: &str) -> Result<(), Error> {
        self.0
            .insert(FLASH_KEY, message)
            .map_err(|error| session_error("persist", error))
    }

    /// Pop the queued flash message, if any.
    #[must_use]
    pub fn take_flash(&self) -> Option<String> {
        match self.0.remove_as::<String>(FLASH_KEY) {
            Some(Ok(message)) => Some(message),
            Some(Err(raw)) => {
                warn!(raw = %raw, "discarding malformed flash message");
                None
            }
            None => None,
        }
    }

    /// CSRF token bound to this session, if one was issued.
    #[must_use]
    pub fn csrf_token(&self) -> Option<String> {
        self.0.get::<String>(CSRF_TOKEN_KEY).ok().flatten()
    }

    /// Bind a CSRF token to this session.
    pub fn set_csrf_token(&self, token: &str) -> Result<(), Error> {
        self.0
            .insert(CSRF_TOKEN_KEY, token)
            .map_err(|error| session_error("persist", error))
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Self(req.get_session())))
    }
}
