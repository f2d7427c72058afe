//! Shared helpers for the HTTP integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`. This
//! module builds the full application over in-memory stores and offers a
//! small cookie-carrying client so tests can walk through page flows.

use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key, SameSite};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::http::header::{HeaderMap, LOCATION};
use actix_web::{test, web};
use chrono::{TimeZone, Utc};
use mockable::Clock;
use regex::Regex;
use snippetbox::inbound::http::session_config::{SESSION_COOKIE_NAME, SessionSettings};
use snippetbox::inbound::http::state::HttpState;
use snippetbox::inbound::http::templates::{TemplateCache, TemplateFunctions};
use snippetbox::server::AppDependencies;
use snippetbox::test_support::{
    InMemorySessionRepository, InMemorySnippetRepository, InMemoryUserRepository, MutableClock,
};

/// In-memory collaborators behind one application instance.
pub struct Stores {
    /// Snippet storage.
    pub snippets: Arc<InMemorySnippetRepository>,
    /// Account storage.
    pub users: Arc<InMemoryUserRepository>,
    /// Server-side session state.
    pub sessions: Arc<InMemorySessionRepository>,
    /// Clock shared by the stores and the handlers.
    pub clock: Arc<MutableClock>,
}

impl Stores {
    /// Empty stores with the clock at 2026-03-14 09:30 UTC.
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
            .single()
            .expect("valid start time");
        let clock = Arc::new(MutableClock::new(start));
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        Self {
            snippets: Arc::new(InMemorySnippetRepository::new(Arc::clone(&dyn_clock))),
            users: Arc::new(InMemoryUserRepository::new()),
            sessions: Arc::new(InMemorySessionRepository::new(dyn_clock)),
            clock,
        }
    }

    /// Application dependencies wired to these stores and the real UI files.
    pub fn deps(&self) -> AppDependencies {
        let ui_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("ui");
        let templates =
            TemplateCache::from_dir(&ui_dir.join("html"), &TemplateFunctions::default())
                .expect("templates build");
        let clock: Arc<dyn Clock> = self.clock.clone();
        AppDependencies {
            http_state: web::Data::new(HttpState::new(
                self.snippets.clone(),
                self.users.clone(),
                self.sessions.clone(),
                Arc::new(templates),
                clock,
            )),
            session: SessionSettings {
                key: Key::generate(),
                cookie_secure: false,
                same_site: SameSite::Lax,
            },
            static_dir: ui_dir.join("static"),
        }
    }
}

/// A response reduced to what the tests inspect.
pub struct Page {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body as text.
    pub body: String,
}

impl Page {
    /// Target of a redirect, if any.
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    /// CSRF token embedded in the page's forms.
    pub fn csrf_token(&self) -> String {
        static TOKEN: OnceLock<Regex> = OnceLock::new();
        let pattern = TOKEN.get_or_init(|| {
            Regex::new(r#"name="csrf_token" value="([0-9a-f]{64})""#).expect("valid regex")
        });
        pattern
            .captures(&self.body)
            .and_then(|captures| captures.get(1))
            .map(|token| token.as_str().to_owned())
            .expect("page should carry a CSRF token")
    }
}

/// Minimal browser: remembers the session cookie between requests.
#[derive(Default)]
pub struct Browser {
    cookie: Option<Cookie<'static>>,
}

impl Browser {
    /// GET `uri` with the held cookie.
    pub async fn get<S, B>(&mut self, app: &S, uri: &str) -> Page
    where
        S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let req = self.with_cookie(test::TestRequest::get().uri(uri));
        self.send(app, req.to_request()).await
    }

    /// POST `form` to `uri` with the held cookie.
    pub async fn post<S, B>(&mut self, app: &S, uri: &str, form: &[(&str, &str)]) -> Page
    where
        S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let req = self.with_cookie(test::TestRequest::post().uri(uri).set_form(form));
        self.send(app, req.to_request()).await
    }

    /// Fetch `form_page`, then post `form` to `uri` with the page's token.
    pub async fn submit<S, B>(
        &mut self,
        app: &S,
        form_page: &str,
        uri: &str,
        form: &[(&str, &str)],
    ) -> Page
    where
        S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let token = self.get(app, form_page).await.csrf_token();
        let mut fields = form.to_vec();
        fields.push(("csrf_token", token.as_str()));
        self.post(app, uri, &fields).await
    }

    /// Create an account and log in with it.
    pub async fn sign_up_and_log_in<S, B>(&mut self, app: &S, email: &str, password: &str)
    where
        S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let signup = self
            .submit(
                app,
                "/user/signup",
                "/user/signup",
                &[("name", "Test User"), ("email", email), ("password", password)],
            )
            .await;
        assert_eq!(signup.status, StatusCode::SEE_OTHER, "{}", signup.body);

        let login = self
            .submit(
                app,
                "/user/login",
                "/user/login",
                &[("email", email), ("password", password)],
            )
            .await;
        assert_eq!(login.status, StatusCode::SEE_OTHER, "{}", login.body);
        assert_eq!(login.location(), Some("/snippet/create"));
    }

    /// Session cookie currently held, if any.
    pub fn cookie(&self) -> Option<Cookie<'static>> {
        self.cookie.clone()
    }

    /// Replace the held session cookie, as a client replaying a captured
    /// cookie would.
    pub fn set_cookie(&mut self, cookie: Cookie<'static>) {
        self.cookie = Some(cookie);
    }

    fn with_cookie(&self, req: test::TestRequest) -> test::TestRequest {
        match &self.cookie {
            Some(cookie) => req.cookie(cookie.clone()),
            None => req,
        }
    }

    async fn send<S, B>(&mut self, app: &S, req: actix_http::Request) -> Page
    where
        S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
        B: MessageBody,
    {
        let res = test::call_service(app, req).await;
        if let Some(cookie) = res
            .response()
            .cookies()
            .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        {
            self.cookie = Some(cookie.into_owned());
        }
        let status = res.status();
        let headers = res.headers().clone();
        let body = test::read_body(res).await;
        Page {
            status,
            headers,
            body: String::from_utf8(body.to_vec()).expect("utf-8 body"),
        }
    }
}
