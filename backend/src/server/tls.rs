//! TLS listener configuration.
//!
//! Certificates and keys are PEM files read through a `cap-std` directory
//! handle. Only modern key exchange groups are offered.

use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cap_std::ambient_authority;
use cap_std::fs::Dir;
use rustls::ServerConfig;
use rustls::crypto::aws_lc_rs;

/// Directory holding `cert.pem` and `key.pem`, relative to the working
/// directory.
pub const TLS_DIR: &str = "./tls";
const CERT_FILE: &str = "cert.pem";
const KEY_FILE: &str = "key.pem";

/// Errors raised while loading TLS material.
#[derive(Debug, thiserror::Error)]
pub enum TlsConfigError {
    /// A PEM file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File location.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The certificate file held no certificates.
    #[error("no certificates found in {path}")]
    NoCertificates {
        /// File location.
        path: PathBuf,
    },
    /// The key file held no private key.
    #[error("no private key found in {path}")]
    NoPrivateKey {
        /// File location.
        path: PathBuf,
    },
    /// rustls rejected the certificate chain or key.
    #[error("invalid TLS configuration: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Build a rustls server configuration from `dir/cert.pem` and `dir/key.pem`.
///
/// # Errors
/// Unreadable files, empty PEM files and mismatched keys are all errors.
pub fn load_server_config(dir: &Path) -> Result<ServerConfig, TlsConfigError> {
    let read = |name: &str| {
        Dir::open_ambient_dir(dir, ambient_authority())
            .and_then(|handle| handle.read(name))
            .map_err(|source| TlsConfigError::Read {
                path: dir.join(name),
                source,
            })
    };

    let cert_pem = read(CERT_FILE)?;
    let certs = rustls_pemfile::certs(&mut BufReader::new(cert_pem.as_slice()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsConfigError::Read {
            path: dir.join(CERT_FILE),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsConfigError::NoCertificates {
            path: dir.join(CERT_FILE),
        });
    }

    let key_pem = read(KEY_FILE)?;
    let key = rustls_pemfile::private_key(&mut BufReader::new(key_pem.as_slice()))
        .map_err(|source| TlsConfigError::Read {
            path: dir.join(KEY_FILE),
            source,
        })?
        .ok_or_else(|| TlsConfigError::NoPrivateKey {
            path: dir.join(KEY_FILE),
        })?;

    let mut provider = aws_lc_rs::default_provider();
    provider.kx_groups = vec![aws_lc_rs::kx_group::X25519, aws_lc_rs::kx_group::SECP256R1];

    let config = ServerConfig::builder_with_provider(Arc::new(provider))
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    Ok(config)
}
