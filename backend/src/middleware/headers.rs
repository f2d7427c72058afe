//! Security headers attached to every response.

use actix_web::http::header;
use actix_web::middleware::DefaultHeaders;

/// Policy allowing same-origin resources plus Google Fonts.
pub const CONTENT_SECURITY_POLICY: &str =
    "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com";

/// Headers set unconditionally on every response.
///
/// Handlers that set one of these headers themselves keep their own value.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use snippetbox::middleware::common_headers;
///
/// let app = App::new().wrap(common_headers());
/// ```
#[must_use]
pub fn common_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((header::CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY))
        .add((header::REFERRER_POLICY, "origin-when-cross-origin"))
        .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .add((header::X_FRAME_OPTIONS, "deny"))
        .add((header::X_XSS_PROTECTION, "0"))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use actix_web::{App, HttpResponse, test, web};
    use rstest::rstest;

    #[rstest]
    #[case(header::CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY)]
    #[case(header::REFERRER_POLICY, "origin-when-cross-origin")]
    #[case(header::X_CONTENT_TYPE_OPTIONS, "nosniff")]
    #[case(header::X_FRAME_OPTIONS, "deny")]
    #[case(header::X_XSS_PROTECTION, "0")]
    #[actix_web::test]
    async fn sets_header_on_every_response(
        #[case] name: header::HeaderName,
        #[case] expected: &str,
    ) {
        let app = test::init_service(
            App::new()
                .wrap(common_headers())
                .route("/", web::get().to(|| async { HttpResponse::NotFound().finish() })),
        )
        .await;
        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(
            res.headers().get(&name).and_then(|value| value.to_str().ok()),
            Some(expected)
        );
    }
}
