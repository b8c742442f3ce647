//! Socket connection driver: the transport that implements
//! `router_core::ClientConnection` over plain TCP and TLS.
//!
//! Owns line framing, ANSI rendering, the ack/back-pressure heuristic,
//! and the pre-/post-authentication command surface. Everything here
//! is a consumer of `router-core`'s `Router`/`Session`/`Channel`
//! types; no routing or session-lifetime logic lives in this crate.

pub mod ack_window;
pub mod ansi;
pub mod commands;
pub mod driver;
pub mod error;
pub mod framing;
pub mod listener;
pub mod socket_connection;
pub mod tls;

pub use driver::SocketDriver;
pub use error::ConnectionError;
pub use socket_connection::SocketConnection;
