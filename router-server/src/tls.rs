//! TLS acceptor construction from PEM certificate/key files.

use crate::error::ConnectionError;
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

/// Builds a `TlsAcceptor` for the socket listener from a PEM
/// certificate chain and private key, requiring TLS 1.2 or newer per
/// the transport's minimum.
pub fn build_acceptor(cert_path: &str, key_path: &str) -> Result<TlsAcceptor, ConnectionError> {
    let certs = load_certs(cert_path)?;
    let key = load_key(key_path)?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| ConnectionError::Tls(e.to_string()))?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}

fn load_certs(path: &str) -> Result<Vec<CertificateDer<'static>>, ConnectionError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ConnectionError::Tls(format!("reading certs from {path}: {e}")))
}

fn load_key(path: &str) -> Result<PrivateKeyDer<'static>, ConnectionError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| ConnectionError::Tls(format!("reading key from {path}: {e}")))?
        .ok_or_else(|| ConnectionError::Tls(format!("no private key found in {path}")))
}
