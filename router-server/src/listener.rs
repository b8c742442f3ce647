//! Accept loops for the plain and TLS listeners.

use crate::error::ConnectionError;
use crate::socket_connection::serve_connection;
use crate::tls;
use router_core::config::RouterConfig;
use router_core::router::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Runs the plain-text accept loop until the listener errors.
/// Intended to be spawned as its own task; each accepted connection
/// gets its own task via [`serve_connection`].
pub async fn run_plain_listener(
    config: Arc<RouterConfig>,
    router: Arc<Router>,
) -> Result<(), ConnectionError> {
    let listener = TcpListener::bind(&config.plain_socket.bind_addr).await?;
    log::info!(target: "listener", "plain socket listening on {}", config.plain_socket.bind_addr);

    loop {
        let (stream, peer) = listener.accept().await?;
        log::debug!(target: "listener", "accepted plain connection from {}", peer);
        let config = config.clone();
        let router = router.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_connection(stream, config, router).await {
                log::warn!(target: "listener", "connection from {} ended: {}", peer, e);
            }
        });
    }
}

/// Runs the TLS accept loop until the listener errors.
pub async fn run_tls_listener(
    config: Arc<RouterConfig>,
    router: Arc<Router>,
) -> Result<(), ConnectionError> {
    let acceptor = tls::build_acceptor(&config.tls_socket.cert_path, &config.tls_socket.key_path)?;
    let listener = TcpListener::bind(&config.tls_socket.bind_addr).await?;
    log::info!(target: "listener", "tls socket listening on {}", config.tls_socket.bind_addr);

    loop {
        let (stream, peer) = listener.accept().await?;
        let acceptor = acceptor.clone();
        let config = config.clone();
        let router = router.clone();
        tokio::spawn(async move {
            match acceptor.accept(stream).await {
                Ok(tls_stream) => {
                    if let Err(e) = serve_connection(tls_stream, config, router).await {
                        log::warn!(target: "listener", "tls connection from {} ended: {}", peer, e);
                    }
                }
                Err(e) => {
                    log::warn!(target: "listener", "tls handshake with {} failed: {}", peer, e);
                }
            }
        });
    }
}
