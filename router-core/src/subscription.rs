//! Per-session channel subscription bookkeeping.

use crate::channel::{Channel, ChannelKind};
use crate::ids::ChannelId;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Tracks a single channel a session is subscribed to: the channel
/// itself, its allocated id, and the blocked outgoing queue the
/// session holds for it while the channel cannot accept more data.
pub struct ChannelSubscription {
    id: ChannelId,
    channel: Arc<dyn Channel>,
    blocked: bool,
    closed: bool,
    last_active: DateTime<Utc>,
}

impl ChannelSubscription {
    /// Creates a new subscription record for a freshly added channel.
    pub fn new(id: ChannelId, channel: Arc<dyn Channel>) -> Self {
        ChannelSubscription { id, channel, blocked: false, closed: false, last_active: Utc::now() }
    }

    /// Records activity on this channel now. Called whenever data
    /// flows in either direction, so idle reaping (e.g. of puppet
    /// channels) can tell a quiet channel from a dead one.
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// How long this channel has gone without activity, in whole
    /// seconds.
    pub fn idle_secs(&self) -> i64 {
        (Utc::now() - self.last_active).num_seconds().max(0)
    }

    /// The id this channel was assigned within the owning session.
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// The channel's name, as reported by the channel itself.
    pub fn name(&self) -> &str {
        self.channel.name()
    }

    /// The channel's subtype, as reported by the channel itself.
    pub fn subtype(&self) -> &str {
        self.channel.subtype()
    }

    /// What kind of payload this channel carries.
    pub fn kind(&self) -> ChannelKind {
        self.channel.kind()
    }

    /// Shared handle to the underlying channel.
    pub fn channel(&self) -> &Arc<dyn Channel> {
        &self.channel
    }

    /// True if the session currently has this channel recorded as
    /// blocked (distinct from `channel.is_blocked()`, which is the
    /// channel's own live state — this is the session's last-known
    /// view, updated only via `channel_flow_blocked`/`_open`).
    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    /// Marks the channel blocked in the session's bookkeeping.
    pub fn set_blocked(&mut self, blocked: bool) {
        self.blocked = blocked;
    }

    /// True if the session has recorded this channel as closed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Marks the channel closed in the session's bookkeeping.
    pub fn set_closed(&mut self) {
        self.closed = true;
    }
}

impl std::fmt::Debug for ChannelSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelSubscription")
            .field("id", &self.id)
            .field("name", &self.channel.name())
            .field("blocked", &self.blocked)
            .field("closed", &self.closed)
            .field("idle_secs", &self.idle_secs())
            .finish()
    }
}
