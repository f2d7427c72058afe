//! Snippetbox entry-point: loads settings, prepares storage and templates,
//! then serves pages until SIGINT or SIGTERM.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::{Clock, DefaultClock, DefaultEnv};
use ortho_config::OrthoConfig;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use snippetbox::inbound::http::session_config::{BuildMode, session_settings_from_env};
use snippetbox::inbound::http::state::HttpState;
use snippetbox::inbound::http::templates::{TemplateCache, TemplateFunctions};
use snippetbox::outbound::persistence::{
    DbPool, DieselSessionRepository, DieselSnippetRepository, DieselUserRepository, PoolConfig,
    run_pending_migrations,
};
use snippetbox::server::{
    AppSettings, ServerConfig, TLS_DIR, create_server, load_server_config,
    purge_expired_sessions, shutdown_signal,
};

const SESSION_PURGE_PERIOD: Duration = Duration::from_secs(300);

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load settings: {err}"))?;
    info!(env = settings.environment(), "starting snippetbox");

    let database_url = settings.database_url()?;
    run_pending_migrations(database_url)
        .await
        .wrap_err("failed to apply database migrations")?;
    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .wrap_err("failed to open database pool")?;

    let ui_dir = settings.ui_dir();
    let templates = TemplateCache::from_dir(&ui_dir.join("html"), &TemplateFunctions::default())
        .wrap_err("failed to build template cache")?;
    info!(pages = templates.page_names().count(), "template cache ready");

    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let sessions = Arc::new(DieselSessionRepository::new(pool.clone(), Arc::clone(&clock)));
    let http_state = web::Data::new(HttpState::new(
        Arc::new(DieselSnippetRepository::new(pool.clone(), Arc::clone(&clock))),
        Arc::new(DieselUserRepository::new(pool, Arc::clone(&clock))),
        sessions.clone(),
        Arc::new(templates),
        clock,
    ));

    actix_web::rt::spawn(async move {
        let mut ticks = tokio::time::interval(SESSION_PURGE_PERIOD);
        loop {
            ticks.tick().await;
            purge_expired_sessions(sessions.as_ref()).await;
        }
    });

    let mut config = ServerConfig::new(settings.socket_addr()?, ui_dir.join("static"))
        .with_shutdown_timeout(settings.shutdown_timeout());
    if settings.tls_enabled {
        let tls = load_server_config(Path::new(TLS_DIR)).wrap_err("failed to load TLS material")?;
        config = config.with_tls(tls);
    }

    let server = create_server(http_state, session, config)?;
    let handle = server.handle();
    actix_web::rt::spawn(async move {
        if let Err(err) = shutdown_signal().await {
            error!(error = %err, "failed to listen for shutdown signals");
            return;
        }
        info!("shutdown signal received; draining in-flight requests");
        handle.stop(true).await;
    });

    server.await?;
    info!("server stopped");
    Ok(())
}
