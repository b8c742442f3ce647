//! Errors raised by the socket connection driver.

use thiserror::Error;

/// Transport and framing failures the driver can hit.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The underlying socket I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer sent a line longer than the configured maximum before
    /// finding a newline; treated as a protocol violation and the
    /// connection is dropped rather than buffering unbounded data.
    #[error("input line exceeded {0} bytes without a newline")]
    LineTooLong(usize),

    /// The peer's bytes were not valid UTF-8.
    #[error("input was not valid utf-8")]
    InvalidUtf8,

    /// TLS handshake or configuration failure.
    #[error("tls error: {0}")]
    Tls(String),
}
