//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rustls::ServerConfig as TlsConfig;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) static_dir: PathBuf,
    pub(crate) shutdown_timeout: Duration,
    pub(crate) tls: Option<TlsConfig>,
}

impl ServerConfig {
    /// Plain HTTP on `bind_addr`, serving assets from `static_dir`.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            bind_addr,
            static_dir: static_dir.into(),
            shutdown_timeout: Duration::from_secs(5),
            tls: None,
        }
    }

    /// Grace period granted to in-flight requests on shutdown.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Serve HTTPS with `tls` instead of plain HTTP.
    #[must_use]
    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Socket address the server will bind to.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    /// Directory served under `/static`.
    #[must_use]
    pub fn static_dir(&self) -> &Path {
        &self.static_dir
    }

    /// Whether the listener uses TLS.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        self.tls.is_some()
    }

    /// Shutdown grace period in whole seconds, rounded up.
    #[must_use]
    pub(crate) const fn shutdown_timeout_secs(&self) -> u64 {
        let secs = self.shutdown_timeout.as_secs();
        if self.shutdown_timeout.subsec_nanos() > 0 {
            secs.saturating_add(1)
        } else {
            secs
        }
    }
}
