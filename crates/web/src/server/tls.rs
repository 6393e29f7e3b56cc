//! TLS material loading
//!
//! PEM files on disk become a `rustls::ServerConfig` once, at startup.
//! Every way the material can be unusable gets its own error variant so a
//! misconfigured deployment fails with a message naming the actual problem
//! before any socket is opened.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::ServerConfig;

#[derive(Error, Debug)]
pub enum TlsError {
    #[error("can't read {}: {source}", path.display())]
    Unreadable { path: PathBuf, source: io::Error },

    #[error("no certificate found in {}", path.display())]
    NoCertificate { path: PathBuf },

    #[error("no private key found in {}", path.display())]
    NoPrivateKey { path: PathBuf },

    /// rustls rejected the material, e.g. the key does not belong to the
    /// certificate.
    #[error("tls configuration rejected: {source}")]
    Config {
        #[from]
        source: tokio_rustls::rustls::Error,
    },
}

impl TlsError {
    fn unreadable(path: &Path, source: io::Error) -> Self {
        Self::Unreadable { path: path.to_path_buf(), source }
    }
}

/// Loads a PEM private key and certificate chain into a server config with
/// no client authentication.
pub fn load_server_config(key_path: &Path, cert_path: &Path) -> Result<ServerConfig, TlsError> {
    let certs = load_certs(cert_path)?;
    let key = load_private_key(key_path)?;

    let config = ServerConfig::builder().with_no_client_auth().with_single_cert(certs, key)?;
    Ok(config)
}

fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let file = std::fs::File::open(path).map_err(|e| TlsError::unreadable(path, e))?;
    let mut reader = io::BufReader::new(file);
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TlsError::unreadable(path, e))?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificate { path: path.to_path_buf() });
    }
    Ok(certs)
}

fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let file = std::fs::File::open(path).map_err(|e| TlsError::unreadable(path, e))?;
    let mut reader = io::BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| TlsError::unreadable(path, e))?
        .ok_or_else(|| TlsError::NoPrivateKey { path: path.to_path_buf() })
}
