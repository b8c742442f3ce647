//! Error taxonomy shared across the router.

use crate::ids::{ChannelId, SessionId};
use thiserror::Error;

/// Errors raised by session and router operations.
///
/// Variants follow the taxonomy laid out for this component: protocol
/// violations from the remote peer, transport failures, channel-level
/// failures, resource exhaustion, and internal invariant violations
/// that should never happen but are still represented rather than
/// panicked on.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The remote peer violated the wire protocol (malformed framing,
    /// an oversize line, a command outside its valid phase).
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The underlying transport failed or was dropped.
    #[error("transport error: {0}")]
    Transport(String),

    /// A channel-level operation failed.
    #[error("channel {channel} error: {message}")]
    Channel {
        /// The channel the error refers to.
        channel: ChannelId,
        /// Human-readable detail.
        message: String,
    },

    /// A resource limit was hit (too many channels, authentication
    /// attempts exhausted, output buffer saturated).
    #[error("resource exhausted: {0}")]
    Resource(String),

    /// An invariant that should be impossible was violated. Logged at
    /// `error!` and treated as fatal to the affected session.
    #[error("internal invariant violated: {0}")]
    Internal(String),

    /// The referenced session does not exist in the router.
    #[error("unknown session {0}")]
    UnknownSession(SessionId),

    /// The referenced channel does not exist on the session.
    #[error("unknown channel {0}")]
    UnknownChannel(ChannelId),
}

impl RouterError {
    /// Convenience constructor for [`RouterError::Channel`].
    pub fn channel(channel: ChannelId, message: impl Into<String>) -> Self {
        RouterError::Channel { channel, message: message.into() }
    }
}
