//! The transport-agnostic interface a session uses to talk to whatever
//! is on the other end of the wire.
//!
//! A concrete implementation (the socket connection driver, in
//! `router-server`) is injected into a `Session` via `set_connection`;
//! the session never depends on sockets or tokio directly.

use crate::event::Event;
use crate::ids::MessageSerialId;

/// Result of attempting to deliver data to a client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendReturnCode {
    /// The data was accepted and will be sent.
    Ok,
    /// The data was accepted, but the connection is now in a blocked
    /// state and further sends should be held until unblocked.
    OkBlocked,
    /// The connection is already blocked; the data was not accepted
    /// and must be queued by the caller.
    Blocked,
    /// The connection has been dropped; the data was discarded.
    Disconnected,
    /// This connection does not support the kind of data being sent
    /// (e.g. a structured message on a plain-text-only driver).
    NotSupported,
}

/// The interface a `Session` uses to push data out to a client.
///
/// Implemented by the socket connection driver. A session holds at
/// most one live `ClientConnection` at a time; reconnect swaps it out
/// via `Session::set_connection` without the session's identity or
/// queued state changing.
pub trait ClientConnection: Send + Sync {
    /// Sends an event to the client, tagged with the serial id the
    /// client should use to acknowledge it.
    fn send_event(&self, serial_id: MessageSerialId, event: &Event) -> SendReturnCode;

    /// Requests that the connection be dropped. Does not block; the
    /// connection's own I/O loop observes the request and tears
    /// itself down.
    fn request_disconnect(&self);

    /// True if the connection believes itself still live.
    fn is_connected(&self) -> bool;
}
