//! The `Session` type: per-client state, independent of any particular
//! transport.
//!
//! A session outlives any one connection. Reconnecting swaps in a new
//! [`ClientConnection`](crate::connection::ClientConnection) without
//! losing queued or in-flight data; disconnecting leaves the session
//! alive (so channels keep delivering into its queues) until the
//! router decides to destroy it.

mod ack;
mod callbacks;
mod client_input;
mod service;
mod state;

pub use state::Session;
