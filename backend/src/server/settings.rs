//! Application settings loaded via OrthoConfig.
//!
//! Every value may come from the command line, a configuration file or a
//! `SNIPPETBOX_*` environment variable. Optional values fall back to
//! development defaults through the accessor methods.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use tracing::warn;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_ENV: &str = "development";
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

fn default_ui_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("ui")
}

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// No database connection string was supplied.
    #[error("SNIPPETBOX_DB_DSN must be set to a PostgreSQL connection URL")]
    MissingDsn,
    /// The bind address is not an IP address.
    #[error("invalid bind address '{value}': {message}")]
    InvalidBindAddr {
        /// Rejected value.
        value: String,
        /// Parser message.
        message: String,
    },
}

/// Settings controlling how the server starts.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SNIPPETBOX")]
pub struct AppSettings {
    /// Listen address, `0.0.0.0` when unset.
    pub bind_addr: Option<String>,
    /// Listen port, `4000` when unset.
    pub bind_port: Option<u16>,
    /// PostgreSQL connection URL.
    pub db_dsn: Option<String>,
    /// Environment tag logged at start.
    pub env: Option<String>,
    /// Grace period for in-flight requests: `<n>`, `<n>s`, `<n>ms` or `<n>m`.
    pub shutdown_timeout: Option<String>,
    /// Serve HTTPS from `./tls/cert.pem` and `./tls/key.pem`.
    #[ortho_config(default = false)]
    pub tls_enabled: bool,
    /// Root holding `html/` templates and `static/` assets.
    pub ui_dir: Option<PathBuf>,
}

impl AppSettings {
    /// Socket address to listen on.
    ///
    /// # Errors
    /// [`SettingsError::InvalidBindAddr`] when the address does not parse.
    pub fn socket_addr(&self) -> Result<SocketAddr, SettingsError> {
        let ip = match self.bind_addr.as_deref() {
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            Some(raw) => raw
                .trim()
                .parse::<IpAddr>()
                .map_err(|err| SettingsError::InvalidBindAddr {
                    value: raw.to_owned(),
                    message: err.to_string(),
                })?,
        };
        Ok(SocketAddr::new(ip, self.bind_port.unwrap_or(DEFAULT_PORT)))
    }

    /// Database connection URL.
    ///
    /// # Errors
    /// [`SettingsError::MissingDsn`] when unset or blank.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.db_dsn
            .as_deref()
            .map(str::trim)
            .filter(|dsn| !dsn.is_empty())
            .ok_or(SettingsError::MissingDsn)
    }

    /// Environment tag, `development` when unset.
    #[must_use]
    pub fn environment(&self) -> &str {
        self.env.as_deref().unwrap_or(DEFAULT_ENV)
    }

    /// Shutdown grace period; unparsable values fall back to five seconds
    /// with a warning.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        let Some(raw) = self.shutdown_timeout.as_deref() else {
            return DEFAULT_SHUTDOWN_TIMEOUT;
        };
        parse_duration(raw).unwrap_or_else(|| {
            warn!(
                value = raw,
                default_secs = DEFAULT_SHUTDOWN_TIMEOUT.as_secs(),
                "invalid shutdown timeout; using default"
            );
            DEFAULT_SHUTDOWN_TIMEOUT
        })
    }

    /// Template and static asset root.
    #[must_use]
    pub fn ui_dir(&self) -> PathBuf {
        self.ui_dir.clone().unwrap_or_else(default_ui_dir)
    }
}

/// Parse `<n>` (seconds), `<n>s`, `<n>ms` or `<n>m`.
#[must_use]
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let trimmed = raw.trim();
    let (digits, unit) = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .map_or((trimmed, "s"), |split| trimmed.split_at(split));
    let value: u64 = digits.parse().ok()?;
    match unit {
        "s" => Some(Duration::from_secs(value)),
        "ms" => Some(Duration::from_millis(value)),
        "m" => value.checked_mul(60).map(Duration::from_secs),
        _ => None,
    }
}
