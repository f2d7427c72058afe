//! CSRF protection bound to the session.
//!
//! Every request passing through [`CsrfProtection`] gets a random token stored
//! in its session and exposed to handlers as a [`CsrfToken`] request
//! extension. Unsafe methods must echo the token either in the
//! `X-CSRF-Token` header or in the `csrf_token` field of a URL-encoded form
//! body; anything else is answered with `400 Bad Request`.
//!
//! Must be wrapped inside the session middleware.

use std::rc::Rc;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::Method;
use actix_web::web::{Bytes, BytesMut};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures_util::StreamExt;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use rand::RngCore;
use tracing::warn;

use crate::inbound::http::session::SessionContext;

/// Form field carrying the token.
pub const CSRF_FORM_FIELD: &str = "csrf_token";
/// Header carrying the token for non-form clients.
pub const CSRF_HEADER: &str = "x-csrf-token";

const TOKEN_BYTES: usize = 32;
const MAX_FORM_BYTES: usize = 64 * 1024;

/// Token issued for the current session, available to handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(String);

impl CsrfToken {
    /// Hex encoded token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    fn generate() -> Self {
        let mut bytes = [0_u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }
}

impl FromRequest for CsrfToken {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = req.extensions().get::<Self>().cloned();
        ready(token.ok_or_else(|| {
            actix_web::error::ErrorInternalServerError("CSRF middleware is not installed")
        }))
    }
}

/// Session-bound CSRF middleware.
#[derive(Clone, Copy, Debug, Default)]
pub struct CsrfProtection;

impl<S, B> Transform<S, ServiceRequest> for CsrfProtection
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = CsrfMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CsrfMiddleware {
            service: Rc::new(service),
        }))
    }
}

/// Service wrapper produced by [`CsrfProtection`].
pub struct CsrfMiddleware<S> {
    service: Rc<S>,
}

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Compare without short-circuiting on the first differing byte.
fn tokens_match(expected: &str, submitted: &str) -> bool {
    expected.len() == submitted.len()
        && expected
            .bytes()
            .zip(submitted.bytes())
            .fold(0_u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

fn form_token(body: &[u8]) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == CSRF_FORM_FIELD)
        .map(|(_, value)| value.into_owned())
}

fn header_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

async fn read_body(payload: &mut Payload) -> Result<Bytes, Error> {
    let mut body = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk?;
        if body.len() + chunk.len() > MAX_FORM_BYTES {
            return Err(actix_web::error::ErrorPayloadTooLarge("form body too large"));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}

/// Put a buffered body back so extractors downstream can read it.
fn requeue(bytes: Bytes) -> Payload {
    let (_, mut payload) = actix_http::h1::Payload::create(true);
    payload.unread_data(bytes);
    Payload::from(payload)
}

fn reject(req: ServiceRequest) -> ServiceResponse {
    warn!(method = %req.method(), uri = %req.uri(), "CSRF token missing or invalid");
    req.into_response(
        HttpResponse::BadRequest()
            .content_type("text/plain; charset=utf-8")
            .body("Bad Request"),
    )
}

impl<S, B> Service<ServiceRequest> for CsrfMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let session = SessionContext::from_service_request(&req);
            let token = match session.csrf_token() {
                Some(existing) => CsrfToken(existing),
                None => {
                    let fresh = CsrfToken::generate();
                    session
                        .set_csrf_token(fresh.as_str())
                        .map_err(actix_web::Error::from)?;
                    fresh
                }
            };
            req.extensions_mut().insert(token.clone());

            if is_safe(req.method()) {
                return service.call(req).await.map(ServiceResponse::map_into_left_body);
            }

            let submitted = match header_token(&req) {
                Some(value) => Some(value),
                None => {
                    let mut payload = req.take_payload();
                    let body = read_body(&mut payload).await?;
                    let value = form_token(&body);
                    req.set_payload(requeue(body));
                    value
                }
            };

            match submitted {
                Some(value) if tokens_match(token.as_str(), &value) => {
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
                _ => Ok(reject(req).map_into_right_body()),
            }
        })
    }
}
