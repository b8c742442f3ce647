//! Snapshot types returned by the session's admin/query surface.
//!
//! Kept as first-class value types (rather than ad hoc tuples) so an
//! admin surface can serialize them directly.

use crate::channel::ChannelKind;
use crate::ids::{ChannelId, EntityId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point-in-time snapshot of a session's activity for admin/who
/// queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// The session's id.
    pub session_id: SessionId,
    /// The entity this session is authenticated as.
    pub entity_id: EntityId,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session last had client activity (a line of input, or
    /// an ack).
    pub last_activity_at: DateTime<Utc>,
    /// True if a live connection is currently attached.
    pub connected: bool,
    /// Number of channels currently subscribed.
    pub channel_count: usize,
}

/// A snapshot of a single channel's state, as returned by
/// `get_channel_info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// The channel's id within the owning session.
    pub id: ChannelId,
    /// The channel's name.
    pub name: String,
    /// The channel's subtype string.
    pub subtype: String,
    /// What kind of payload the channel carries.
    pub kind: ChannelInfoKind,
    /// Whether the session currently considers this channel blocked.
    pub blocked: bool,
    /// Whether the session has recorded this channel as closed.
    pub closed: bool,
    /// Seconds since data last flowed over this channel in either
    /// direction.
    pub idle_secs: i64,
}

/// Serializable mirror of [`ChannelKind`] (kept distinct so the trait
/// type doesn't need to derive serde).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelInfoKind {
    /// Plain or styled text.
    Text,
    /// Opaque structured/binary messages.
    Structured,
}

impl From<ChannelKind> for ChannelInfoKind {
    fn from(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Text => ChannelInfoKind::Text,
            ChannelKind::Structured => ChannelInfoKind::Structured,
        }
    }
}
