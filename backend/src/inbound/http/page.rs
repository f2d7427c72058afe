//! Rendering of full HTML pages.
//!
//! Every page sees the same ambient data: the current year, a flash message
//! popped from the session, whether the visitor is logged in and the CSRF
//! token for its forms. [`PageContext`] gathers those from the request and
//! [`render`] turns a [`TemplateData`] into a response.

use actix_session::SessionExt;
use actix_web::dev::Payload;
use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{FromRequest, HttpMessage, HttpRequest, HttpResponse};
use chrono::{DateTime, Datelike, Utc};
use futures_util::future::{Ready, ready};
use serde::Serialize;
use tracing::error;

use crate::domain::{Error, Snippet};
use crate::inbound::http::error::HandlerResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::middleware::{AuthenticatedUser, CsrfToken};

/// Values available to every page template.
#[derive(Debug, Default, Serialize)]
pub struct TemplateData {
    /// Year shown in the footer.
    pub current_year: i32,
    /// One-shot message queued by the previous request.
    pub flash: Option<String>,
    /// Whether the visitor is logged in.
    pub is_authenticated: bool,
    /// Token every form must echo back.
    pub csrf_token: String,
    /// Snippet shown on the view page.
    pub snippet: Option<Snippet>,
    /// Snippets listed on the home page.
    pub snippets: Vec<Snippet>,
    /// Submitted or default form values with their validation errors.
    pub form: Option<serde_json::Value>,
}

impl TemplateData {
    /// Attach form values and errors.
    ///
    /// # Errors
    /// Fails only when `form` cannot be represented as JSON.
    pub fn with_form<F: Serialize>(mut self, form: &F) -> HandlerResult<Self> {
        let value = serde_json::to_value(form)
            .map_err(|err| Error::internal(format!("failed to serialise form: {err}")))?;
        self.form = Some(value);
        Ok(self)
    }
}

/// Request-derived ambient page data.
///
/// The flash message is only popped when [`PageContext::data`] is called, so
/// handlers that redirect instead of rendering leave it queued.
pub struct PageContext {
    session: SessionContext,
    is_authenticated: bool,
    csrf_token: String,
}

impl PageContext {
    /// Build template data for a page rendered at `now`.
    #[must_use]
    pub fn data(&self, now: DateTime<Utc>) -> TemplateData {
        TemplateData {
            current_year: now.year(),
            flash: self.session.take_flash(),
            is_authenticated: self.is_authenticated,
            csrf_token: self.csrf_token.clone(),
            ..TemplateData::default()
        }
    }
}

impl FromRequest for PageContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let csrf_token = req
            .extensions()
            .get::<CsrfToken>()
            .map(|token| token.as_str().to_owned())
            .unwrap_or_default();
        ready(Ok(Self {
            session: SessionContext::new(req.get_session()),
            is_authenticated: AuthenticatedUser::is_present(req),
            csrf_token,
        }))
    }
}

/// Render `page` with `data` as an HTML response with `status`.
///
/// The page is rendered into memory first, so a template error yields a clean
/// 500 instead of a truncated page.
///
/// # Errors
/// Unknown pages and render failures are internal errors.
pub fn render(
    state: &HttpState,
    page: &str,
    status: StatusCode,
    data: &TemplateData,
) -> HandlerResult<HttpResponse> {
    let body = state.templates.render(page, data).map_err(|err| {
        error!(page, error = %err, "template rendering failed");
        Error::internal(err.to_string())
    })?;
    Ok(HttpResponse::build(status)
        .insert_header(ContentType::html())
        .body(body))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use serde::Serialize;

    #[derive(Serialize)]
    struct SampleForm {
        title: &'static str,
    }

    #[rstest]
    fn template_data_serialises_every_ambient_field() {
        let data = TemplateData {
            current_year: 2026,
            flash: Some("hi".to_owned()),
            is_authenticated: true,
            csrf_token: "abc".to_owned(),
            ..TemplateData::default()
        }
        .with_form(&SampleForm { title: "t" })
        .expect("form serialises");

        let value = serde_json::to_value(&data).expect("serialise");
        assert_eq!(value["current_year"], 2026);
        assert_eq!(value["flash"], "hi");
        assert_eq!(value["is_authenticated"], true);
        assert_eq!(value["csrf_token"], "abc");
        assert_eq!(value["form"]["title"], "t");
        assert!(value["snippet"].is_null());
    }

    #[actix_web::test]
    async fn page_context_pops_flash_and_exposes_csrf_token() {
        use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};
        use crate::middleware::CsrfProtection;
        use actix_web::{App, test, web};

        let now = Utc
            .with_ymd_and_hms(2031, 6, 1, 0, 0, 0)
            .single()
            .expect("valid time");
        let app = test::init_service(
            App::new()
                .wrap(CsrfProtection)
                .wrap(test_session_middleware())
                .route(
                    "/flash",
                    web::get().to(|session: SessionContext| async move {
                        session.put_flash("saved")?;
                        Ok::<_, Error>(HttpResponse::Ok().finish())
                    }),
                )
                .route(
                    "/page",
                    web::get().to(move |page: PageContext| async move {
                        HttpResponse::Ok().json(page.data(now))
                    }),
                ),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/flash").to_request()).await;
        let cookie = session_cookie(&res).expect("session cookie");

        let req = test::TestRequest::get().uri("/page").cookie(cookie).to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["current_year"], 2031);
        assert_eq!(body["flash"], "saved");
        assert_eq!(body["is_authenticated"], false);
        assert_eq!(body["csrf_token"].as_str().map(str::len), Some(64));
    }
}
