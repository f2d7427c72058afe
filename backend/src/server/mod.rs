//! Server construction and middleware wiring.
//!
//! Three middleware chains are assembled here, once, with `.wrap` calls. The
//! last `.wrap` on a builder runs first:
//!
//! - public (`/static`, `/ping`): panic recovery > request logging > headers
//! - dynamic (pages): public chain > session > CSRF > authenticate
//! - protected (create, logout): dynamic chain > require authentication
//!
//! Session state lives in the [`SessionRepository`] carried by
//! [`HttpState`]; [`purge_expired_sessions`] clears out rows past expiry.

mod config;
mod settings;
mod tls;

pub use config::ServerConfig;
pub use settings::{AppSettings, SettingsError, parse_duration};
pub use tls::{TLS_DIR, TlsConfigError, load_server_config};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use actix_files::Files;
use actix_web::body::MessageBody;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::{debug, info, warn};

use crate::domain::ports::SessionRepository;
use crate::inbound::http::health::ping;
use crate::inbound::http::session_config::SessionSettings;
use crate::inbound::http::session_store::RepositorySessionStore;
use crate::inbound::http::snippets::{home, snippet_create, snippet_create_post, snippet_view};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::{
    user_login, user_login_post, user_logout_post, user_signup, user_signup_post,
};
use crate::middleware::{
    Authenticate, CsrfProtection, RecoverPanic, RequireAuthentication, Trace, common_headers,
};

const KEEP_ALIVE: Duration = Duration::from_secs(60);
const CLIENT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Everything a worker needs to build its application instance.
#[derive(Clone)]
pub struct AppDependencies {
    /// Handler state shared by all workers.
    pub http_state: web::Data<HttpState>,
    /// Session cookie settings.
    pub session: SessionSettings,
    /// Directory served under `/static`.
    pub static_dir: PathBuf,
}

/// Build the application with every route and middleware chain.
#[must_use]
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    build_app_with(deps, page_routes)
}

/// Build the application with `routes` mounted inside the dynamic chain.
#[must_use]
pub(crate) fn build_app_with<F>(
    deps: AppDependencies,
    routes: F,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
>
where
    F: FnOnce(&mut web::ServiceConfig),
{
    let AppDependencies {
        http_state,
        session,
        static_dir,
    } = deps;
    let users = Arc::clone(&http_state.users);
    let store = RepositorySessionStore::new(Arc::clone(&http_state.sessions));

    let dynamic = web::scope("")
        .wrap(Authenticate::new(users))
        .wrap(CsrfProtection)
        .wrap(session.middleware(store))
        .configure(routes);

    App::new()
        .app_data(http_state)
        .wrap(common_headers())
        .wrap(Trace)
        .wrap(RecoverPanic)
        .service(Files::new("/static", static_dir))
        .service(web::resource("/ping").route(web::get().to(ping)))
        .service(dynamic)
}

fn page_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(home)))
        .service(web::resource("/snippet/view/{id}").route(web::get().to(snippet_view)))
        .service(
            web::resource("/user/signup")
                .route(web::get().to(user_signup))
                .route(web::post().to(user_signup_post)),
        )
        .service(
            web::resource("/user/login")
                .route(web::get().to(user_login))
                .route(web::post().to(user_login_post)),
        )
        .service(
            web::resource("/snippet/create")
                .wrap(RequireAuthentication)
                .route(web::get().to(snippet_create))
                .route(web::post().to(snippet_create_post)),
        )
        .service(
            web::resource("/user/logout")
                .wrap(RequireAuthentication)
                .route(web::post().to(user_logout_post)),
        );
}

/// Remove expired sessions once, logging the outcome.
///
/// Returns the number of sessions removed; failures are logged and count as
/// zero so a periodic caller keeps running.
pub async fn purge_expired_sessions(sessions: &dyn SessionRepository) -> usize {
    match sessions.delete_expired().await {
        Ok(removed) => {
            debug!(removed, "purged expired sessions");
            removed
        }
        Err(error) => {
            warn!(%error, "failed to purge expired sessions");
            0
        }
    }
}

/// Construct an Actix HTTP server from the application dependencies.
///
/// Signal handling is left to the caller, which should stop the returned
/// server through its handle; in-flight requests then get the configured
/// grace period.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    http_state: web::Data<HttpState>,
    session: SessionSettings,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let shutdown_secs = config.shutdown_timeout_secs();
    let ServerConfig {
        bind_addr,
        static_dir,
        tls,
        ..
    } = config;
    let deps = AppDependencies {
        http_state,
        session,
        static_dir,
    };

    let builder = HttpServer::new(move || build_app(deps.clone()))
        .disable_signals()
        .shutdown_timeout(shutdown_secs)
        .keep_alive(KEEP_ALIVE)
        .client_request_timeout(CLIENT_REQUEST_TIMEOUT);

    let bound = match tls {
        Some(tls) => {
            info!(addr = %bind_addr, "starting HTTPS server");
            builder.bind_rustls_0_23(bind_addr, tls)?
        }
        None => {
            info!(addr = %bind_addr, "starting HTTP server");
            builder.bind(bind_addr)?
        }
    };
    Ok(bound.run())
}

/// Resolve once SIGINT or SIGTERM is received.
///
/// # Errors
/// Fails when the signal handlers cannot be installed.
pub async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = terminate.recv() => {}
        }
        Ok(())
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}
