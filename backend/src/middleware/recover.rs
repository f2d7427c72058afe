//! Panic recovery middleware.
//!
//! Catches panics raised while calling or polling any inner service, logs the
//! panic payload, and fails the request with an error whose response is
//! `500 Internal Server Error` with the connection marked for close. The
//! worker keeps serving other requests.
//!
//! The request is never cloned here: actix needs unique access to it while
//! routing.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::task::{Context, Poll};

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::error::InternalError;
use actix_web::http::{Method, Uri, header};
use actix_web::{Error, HttpResponse};
use futures_util::FutureExt;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::error;

/// Outermost middleware converting panics into 500 responses.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use snippetbox::middleware::RecoverPanic;
///
/// let app = App::new().wrap(RecoverPanic);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct RecoverPanic;

impl<S, B> Transform<S, ServiceRequest> for RecoverPanic
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RecoverPanicMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RecoverPanicMiddleware { service }))
    }
}

/// Service wrapper produced by [`RecoverPanic`].
pub struct RecoverPanicMiddleware<S> {
    service: S,
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

fn recovered(method: &Method, uri: &Uri, payload: &(dyn Any + Send)) -> Error {
    let message = panic_message(payload);
    error!(%method, %uri, panic = message, "recovered from panic");
    let response = HttpResponse::InternalServerError()
        .insert_header((header::CONNECTION, "close"))
        .force_close()
        .content_type("text/plain; charset=utf-8")
        .body("Internal Server Error");
    InternalError::from_response(message.to_owned(), response).into()
}

impl<S, B> Service<ServiceRequest> for RecoverPanicMiddleware<S>
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
        let method = req.method().clone();
        let uri = req.uri().clone();

        let fut = match std::panic::catch_unwind(AssertUnwindSafe(|| self.service.call(req))) {
            Ok(fut) => fut,
            Err(payload) => {
                let err = recovered(&method, &uri, payload.as_ref());
                return Box::pin(async move { Err(err) });
            }
        };

        Box::pin(async move {
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(recovered(&method, &uri, payload.as_ref())),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test, web};
    use rstest::rstest;

    async fn boom() -> HttpResponse {
        panic!("handler exploded")
    }

    #[rstest]
    #[actix_web::test]
    async fn panicking_handler_yields_500_and_server_keeps_serving() {
        let app = actix_test::init_service(
            App::new()
                .wrap(RecoverPanic)
                .route("/boom", web::get().to(boom))
                .route("/ok", web::get().to(|| async { HttpResponse::Ok().body("OK") })),
        )
        .await;

        let err = app
            .call(actix_test::TestRequest::get().uri("/boom").to_request())
            .await
            .err()
            .expect("panic becomes an error");
        let res = err.error_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            res.headers().get(header::CONNECTION).and_then(|v| v.to_str().ok()),
            Some("close")
        );

        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/ok").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[rstest]
    #[case(Box::new("static str") as Box<dyn Any + Send>, "static str")]
    #[case(Box::new(String::from("owned")) as Box<dyn Any + Send>, "owned")]
    #[case(Box::new(7_u8) as Box<dyn Any + Send>, "non-string panic payload")]
    fn panic_messages_are_extracted(#[case] payload: Box<dyn Any + Send>, #[case] expected: &str) {
        assert_eq!(panic_message(payload.as_ref()), expected);
    }
}
