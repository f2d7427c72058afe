//! HTTP adapter mapping for domain errors.
//!
//! Keeps the domain error type HTTP-agnostic while letting handlers return
//! it directly. Error pages are plain text carrying the canonical reason
//! phrase of the status; internal details stay attached to the
//! response for the request logger and are never sent.

use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, ResponseError, http::StatusCode};

use crate::domain::ports::{SnippetRepositoryError, UserPersistenceError};
use crate::domain::{Error, ErrorCode};
use crate::middleware::trace::{TRACE_ID_HEADER, TraceId};

/// Convenient result alias for HTTP handlers.
pub type HandlerResult<T> = Result<T, Error>;

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Plain-text body for `status`, e.g. `Not Found`.
#[must_use]
pub(crate) fn status_text(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown Status")
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let mut builder = HttpResponse::build(status);
        builder.insert_header(ContentType::plaintext());
        if let Some(id) = TraceId::current() {
            builder.insert_header((TRACE_ID_HEADER, id.to_string()));
        }
        builder.body(status_text(status))
    }
}

impl From<SnippetRepositoryError> for Error {
    fn from(err: SnippetRepositoryError) -> Self {
        match err {
            SnippetRepositoryError::NoRecord => Error::not_found("no matching snippet"),
            other => Error::internal(other.to_string()),
        }
    }
}

impl From<UserPersistenceError> for Error {
    fn from(err: UserPersistenceError) -> Self {
        match err {
            UserPersistenceError::DuplicateEmail | UserPersistenceError::InvalidCredentials => {
                Error::invalid_request(err.to_string())
            }
            other => Error::internal(other.to_string()),
        }
    }
}
