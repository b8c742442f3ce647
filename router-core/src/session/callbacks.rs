use super::state::Session;
use crate::channel::ChannelListener;
use crate::event::{ChannelStatusChange, Event};
use crate::ids::ChannelId;

impl ChannelListener for Session {
    fn channel_added(&self, channel_id: ChannelId) {
        let name = self.channel_name(channel_id).unwrap_or_default();
        self.queue_status(ChannelStatusChange::Open {
            channel_id,
            name,
            direction: crate::event::Direction::Bidirectional,
        });

        let initially_blocked = {
            let inner = self.inner.lock();
            inner.channels.get(&channel_id).map(|sub| sub.channel().is_blocked()).unwrap_or(false)
        };
        if initially_blocked {
            self.channel_flow_blocked(channel_id);
        }
    }

    fn channel_flow_blocked(&self, channel_id: ChannelId) {
        {
            let mut inner = self.inner.lock();
            if let Some(sub) = inner.channels.get_mut(&channel_id) {
                sub.set_blocked(true);
            }
        }
        self.queue_status(ChannelStatusChange::Blocked { channel_id });
    }

    fn channel_flow_open(&self, channel_id: ChannelId) {
        let replay = {
            let mut inner = self.inner.lock();
            if let Some(sub) = inner.channels.get_mut(&channel_id) {
                sub.set_blocked(false);
            }
            inner.blocked_queues.remove(&channel_id).unwrap_or_default()
        };
        self.queue_status(ChannelStatusChange::Unblocked { channel_id });

        let channel = {
            let inner = self.inner.lock();
            inner.channels.get(&channel_id).map(|s| s.channel().clone())
        };
        if let Some(channel) = channel {
            for event in replay {
                if let Err(e) = channel.send_item(event) {
                    log::warn!(target: "session", "{} replay to channel {} failed: {}", self.session_id, channel_id, e);
                }
            }
        }
    }

    fn channel_flow_closed(&self, channel_id: ChannelId) {
        {
            let mut inner = self.inner.lock();
            if let Some(sub) = inner.channels.get_mut(&channel_id) {
                sub.set_closed();
            }
        }
        self.queue_status(ChannelStatusChange::Closed { channel_id });
    }

    fn channel_destructed(&self, channel_id: ChannelId) {
        let mut inner = self.inner.lock();
        inner.channels.remove(&channel_id);
        inner.blocked_queues.remove(&channel_id);
        log::debug!(target: "session", "{} channel {} destructed", self.session_id, channel_id);
    }

    fn text_channel_data(&self, channel_id: ChannelId, event: Event) {
        self.queue_outgoing(channel_id, event);
    }

    fn client_channel_data(&self, channel_id: ChannelId, event: Event) {
        self.queue_outgoing(channel_id, event);
    }
}

impl Session {
    /// Invokes the [`ChannelListener::channel_added`] callback on
    /// `self`. Named distinctly from the inherent
    /// [`Session::channel_added`] (which allocates the id in the
    /// first place) since the two share a method name but not a
    /// signature, and Rust's inherent-method priority would otherwise
    /// make the trait method unreachable through `self.channel_added(..)`.
    pub fn channel_added_notify(&self, channel_id: ChannelId) {
        ChannelListener::channel_added(self, channel_id);
    }

    fn queue_status(&self, change: ChannelStatusChange) {
        let channel_id = match &change {
            ChannelStatusChange::Open { channel_id, .. }
            | ChannelStatusChange::Blocked { channel_id }
            | ChannelStatusChange::Unblocked { channel_id }
            | ChannelStatusChange::Closed { channel_id } => *channel_id,
        };
        self.queue_outgoing(channel_id, Event::channel_status(change));
    }

    pub(super) fn queue_outgoing(&self, channel_id: ChannelId, event: Event) {
        let mut inner = self.inner.lock();
        if let Some(sub) = inner.channels.get_mut(&channel_id) {
            sub.touch();
        }
        let serial = self.next_serial(&mut inner);
        inner.outgoing.push_back((serial, event));
    }
}
