use crate::channel::Channel;
use crate::connection::ClientConnection;
use crate::error::RouterError;
use crate::event::Event;
use crate::ids::{ChannelId, ChannelIdAllocator, EntityId, MessageSerialId, SessionId};
use crate::stats::{ChannelInfo, ChannelInfoKind, SessionStats};
use crate::subscription::ChannelSubscription;
use crate::sync::Mutex;
use chrono::Utc;
use hashbrown::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;

/// Everything about a session that needs to change under lock. Kept
/// separate from `Session` itself so [`super::service::Session::service`]
/// can briefly release the lock across a channel call without
/// restructuring the type.
pub(super) struct Inner {
    pub(super) connection: Option<Arc<dyn ClientConnection>>,
    pub(super) connected: bool,
    pub(super) connection_blocked: bool,
    pub(super) disconnect_requested: bool,
    pub(super) channels: HashMap<ChannelId, ChannelSubscription>,
    pub(super) channel_alloc: ChannelIdAllocator,
    /// Events queued for delivery to the client but not yet handed to
    /// the connection (e.g. because the connection was blocked or not
    /// yet attached).
    pub(super) outgoing: VecDeque<(MessageSerialId, Event)>,
    /// Events handed to the connection but not yet acknowledged;
    /// retained so a reconnect can replay them.
    pub(super) sent: VecDeque<(MessageSerialId, Event)>,
    /// Client-originated data queued per channel while that channel
    /// is blocked.
    pub(super) blocked_queues: HashMap<ChannelId, VecDeque<Event>>,
    pub(super) next_serial: MessageSerialId,
    pub(super) last_activity_at: chrono::DateTime<Utc>,
    /// Peer's declared receive window: the maximum number of events
    /// that may sit in `sent` (unacknowledged) or in any one channel's
    /// `blocked_queues` entry at once.
    pub(super) client_window_size: u32,
}

/// Per-client session state, independent of transport.
///
/// See the module-level docs for the reconnect/disconnect lifecycle.
pub struct Session {
    pub(super) session_id: SessionId,
    pub(super) entity_id: EntityId,
    pub(super) created_at: chrono::DateTime<Utc>,
    pub(super) inner: Mutex<Inner>,
}

impl Session {
    /// Creates a new session for the given entity, with the peer's
    /// declared receive window (see `RouterConfig::client_window_size`
    /// for the usual source of this value). Sessions always start
    /// disconnected; the router attaches a connection via
    /// [`Session::set_connection`] once the transport handshake
    /// completes.
    pub fn new(session_id: SessionId, entity_id: EntityId, client_window_size: u32) -> Self {
        let now = Utc::now();
        Session {
            session_id,
            entity_id,
            created_at: now,
            inner: Mutex::new(Inner {
                connection: None,
                connected: false,
                connection_blocked: false,
                disconnect_requested: false,
                channels: HashMap::new(),
                channel_alloc: ChannelIdAllocator::default(),
                outgoing: VecDeque::new(),
                sent: VecDeque::new(),
                blocked_queues: HashMap::new(),
                next_serial: MessageSerialId::NONE,
                last_activity_at: now,
                client_window_size: client_window_size.max(1),
            }),
        }
    }

    /// The session's id. Stable for the session's entire lifetime,
    /// including across reconnects.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// The entity this session is authenticated as.
    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    /// Attaches a new connection to this session, replacing any
    /// previous one.
    ///
    /// This is the reconnect path: any events still held in the
    /// "sent but unacknowledged" queue are re-queued ahead of newly
    /// pending output so the new connection replays them in order.
    pub fn set_connection(&self, connection: Arc<dyn ClientConnection>) {
        let mut inner = self.inner.lock();
        let replay: Vec<_> = inner.sent.drain(..).collect();
        for item in replay.into_iter().rev() {
            inner.outgoing.push_front(item);
        }
        inner.connection = Some(connection);
        inner.connected = true;
        inner.connection_blocked = false;
        inner.disconnect_requested = false;
        inner.last_activity_at = Utc::now();
        log::info!(target: "session", "{} connection attached, {} events queued for replay", self.session_id, inner.outgoing.len());
    }

    /// Called by the driver when the underlying connection is lost
    /// unexpectedly (not via `request_disconnect`). The session stays
    /// alive; channels keep delivering into its queues until a new
    /// connection reconnects or the router reaps the session.
    pub fn connection_dropped(&self) {
        let mut inner = self.inner.lock();
        inner.connection = None;
        inner.connected = false;
        log::info!(target: "session", "{} connection dropped", self.session_id);
    }

    /// Requests that the session's connection, if any, be
    /// disconnected. The session itself is not destroyed; this only
    /// tears down the transport.
    pub fn request_disconnect(&self) {
        let mut inner = self.inner.lock();
        inner.disconnect_requested = true;
        if let Some(conn) = inner.connection.as_ref() {
            conn.request_disconnect();
        }
    }

    /// True if a live connection is currently attached.
    pub fn is_connected(&self) -> bool {
        self.inner.lock().connected
    }

    /// A point-in-time snapshot of this session's activity.
    pub fn stats(&self) -> SessionStats {
        let inner = self.inner.lock();
        SessionStats {
            session_id: self.session_id,
            entity_id: self.entity_id,
            created_at: self.created_at,
            last_activity_at: inner.last_activity_at,
            connected: inner.connected,
            channel_count: inner.channels.len(),
        }
    }

    /// Snapshots every channel this session is currently subscribed
    /// to.
    pub fn get_channel_info(&self) -> Vec<ChannelInfo> {
        let inner = self.inner.lock();
        inner
            .channels
            .values()
            .map(|sub| ChannelInfo {
                id: sub.id(),
                name: sub.name().to_string(),
                subtype: sub.subtype().to_string(),
                kind: ChannelInfoKind::from(sub.kind()),
                blocked: sub.is_blocked(),
                closed: sub.is_closed(),
                idle_secs: sub.idle_secs(),
            })
            .collect()
    }

    /// Subscribes the session to a new channel, allocating and
    /// returning its session-scoped id.
    ///
    /// Per the channel-listener contract, the channel itself is
    /// notified of the assigned id via
    /// [`ChannelListener::channel_added`](crate::channel::ChannelListener::channel_added)
    /// by the caller (typically the router), not by this method.
    pub fn channel_added(&self, channel: Arc<dyn Channel>) -> ChannelId {
        let mut inner = self.inner.lock();
        let id = inner.channel_alloc.allocate();
        let name = channel.name().to_string();
        inner.channels.insert(id, ChannelSubscription::new(id, channel));
        log::debug!(target: "session", "{} added channel {} ({})", self.session_id, id, name);
        id
    }

    /// Closes every channel whose name starts with `prefix` and which
    /// has gone at least `idle_threshold_secs` without activity.
    /// Returns the number of channels closed.
    ///
    /// Used by the driver's puppet-channel reaper: a puppet left
    /// unattended for too long is closed rather than held open
    /// indefinitely.
    pub fn close_idle_channels(&self, prefix: &str, idle_threshold_secs: i64) -> usize {
        let to_close: Vec<Arc<dyn Channel>> = {
            let inner = self.inner.lock();
            inner
                .channels
                .values()
                .filter(|sub| sub.name().starts_with(prefix) && sub.idle_secs() >= idle_threshold_secs)
                .map(|sub| sub.channel().clone())
                .collect()
        };
        let count = to_close.len();
        for channel in to_close {
            channel.close_channel();
        }
        count
    }

    /// Looks up a channel's name, if the session currently holds it.
    /// Used by callers that need the name without cloning the whole
    /// subscription (e.g. logging).
    pub(super) fn channel_name(&self, channel_id: ChannelId) -> Option<String> {
        self.inner.lock().channels.get(&channel_id).map(|s| s.name().to_string())
    }

    /// Allocates the next outgoing serial id.
    pub(super) fn next_serial(&self, inner: &mut Inner) -> MessageSerialId {
        inner.next_serial = inner.next_serial.next();
        inner.next_serial
    }

    pub(super) fn err_unknown_channel(&self, channel_id: ChannelId) -> RouterError {
        RouterError::UnknownChannel(channel_id)
    }
}
