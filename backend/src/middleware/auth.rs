//! Session authentication middleware.
//!
//! [`Authenticate`] resolves the user id stored in the session and, when the
//! account still exists, attaches an [`AuthenticatedUser`] to the request.
//! [`RequireAuthentication`] turns the absence of that marker into a redirect
//! to the login page.

use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{CACHE_CONTROL, HeaderValue, LOCATION};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest, HttpResponse};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{debug, error};

use crate::domain::UserId;
use crate::domain::ports::UserRepository;
use crate::inbound::http::session::SessionContext;

/// Page unauthenticated visitors are sent to.
pub const LOGIN_PATH: &str = "/user/login";

/// Marker for a request made by a logged-in user whose account exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

impl AuthenticatedUser {
    /// Whether `req` carries an authenticated user.
    #[must_use]
    pub fn is_present(req: &HttpRequest) -> bool {
        req.extensions().contains::<Self>()
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req.extensions().get::<Self>().copied();
        ready(user.ok_or_else(|| actix_web::error::ErrorUnauthorized("login required")))
    }
}

/// Resolves the session user against the user store.
///
/// Must be wrapped inside the session middleware.
#[derive(Clone)]
pub struct Authenticate {
    users: Arc<dyn UserRepository>,
}

impl Authenticate {
    /// Middleware checking session users against `users`.
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authenticate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticateMiddleware {
            service: Rc::new(service),
            users: Arc::clone(&self.users),
        }))
    }
}

/// Service wrapper produced by [`Authenticate`].
pub struct AuthenticateMiddleware<S> {
    service: Rc<S>,
    users: Arc<dyn UserRepository>,
}

impl<S, B> Service<ServiceRequest> for AuthenticateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let users = Arc::clone(&self.users);

        Box::pin(async move {
            if let Some(user_id) = SessionContext::from_service_request(&req).authenticated_user_id()
            {
                match users.exists(user_id).await {
                    Ok(true) => {
                        req.extensions_mut().insert(AuthenticatedUser(user_id));
                    }
                    Ok(false) => debug!(%user_id, "session refers to a missing user"),
                    Err(err) => {
                        error!(error = %err, "failed to check session user");
                        return Err(crate::domain::Error::from(err).into());
                    }
                }
            }
            service.call(req).await
        })
    }
}

/// Redirects anonymous visitors to the login page and stops authenticated
/// pages from being cached.
///
/// Must be wrapped inside [`Authenticate`].
#[derive(Clone, Copy, Debug, Default)]
pub struct RequireAuthentication;

impl<S, B> Transform<S, ServiceRequest> for RequireAuthentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireAuthenticationMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAuthenticationMiddleware { service }))
    }
}

/// Service wrapper produced by [`RequireAuthentication`].
pub struct RequireAuthenticationMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequireAuthenticationMiddleware<S>
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

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !req.extensions().contains::<AuthenticatedUser>() {
            let res = req.into_response(
                HttpResponse::SeeOther()
                    .insert_header((LOCATION, LOGIN_PATH))
                    .finish(),
            );
            return Box::pin(async move { Ok(res.map_into_right_body()) });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let mut res = fut.await?;
            res.headers_mut()
                .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
            Ok(res.map_into_left_body())
        })
    }
}
