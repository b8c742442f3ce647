//! Core session and channel routing types for the text server protocol.
//!
//! This crate has no knowledge of sockets or wire framing — that lives in
//! `router-server`. It owns the session lifecycle, the event envelope that
//! flows between channels and clients, and the single-threaded router that
//! owns every session.

#![warn(missing_docs)]

/// Shared synchronization primitives, re-exported so the rest of the crate
/// (and `router-server`) agree on one lock implementation.
pub mod sync {
    /// Mutual-exclusion lock. Aliased so call sites read like `std::sync`
    /// but get `parking_lot`'s faster, non-poisoning implementation.
    pub type Mutex<T> = parking_lot::Mutex<T>;
    /// Reader-writer lock, same rationale as [`Mutex`].
    pub type RwLock<T> = parking_lot::RwLock<T>;
}

pub mod channel;
pub mod config;
pub mod connection;
pub mod error;
pub mod event;
pub mod ids;
pub mod router;
pub mod session;
pub mod stats;
pub mod subscription;

pub use channel::{Channel, ChannelKind, ChannelListener, SendOutcome};
pub use config::RouterConfig;
pub use connection::{ClientConnection, SendReturnCode};
pub use error::RouterError;
pub use event::{ChannelStatusChange, Direction, Event, EventPayload};
pub use ids::{ChannelId, EntityId, MessageSerialId, SessionId};
pub use router::{AuthBackend, AuthResult, ConnectionDriver, Router};
pub use session::Session;
pub use stats::{ChannelInfo, SessionStats};
pub use subscription::ChannelSubscription;
