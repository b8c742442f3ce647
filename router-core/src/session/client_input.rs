use super::ack::apply_ack;
use super::state::Session;
use crate::channel::SendOutcome;
use crate::error::RouterError;
use crate::event::Event;
use crate::ids::{ChannelId, MessageSerialId};

impl Session {
    /// Delivers a line of client-originated text to the channel
    /// identified by `channel_id`.
    ///
    /// If the channel is currently blocked, the event is queued and
    /// replayed (in order) once [`Session::client_unblocked`] or a
    /// `channel_flow_open` callback clears it.
    pub fn client_data(&self, channel_id: ChannelId, text: impl Into<String>) -> Result<(), RouterError> {
        let event = Event::plain_text(channel_id, text);
        self.client_data_event(channel_id, event)
    }

    /// Delivers a structured client-originated message to the channel
    /// identified by `channel_id`. See [`Session::client_data`] for
    /// the blocked-channel behavior.
    pub fn client_data_structured(&self, channel_id: ChannelId, bytes: Vec<u8>) -> Result<(), RouterError> {
        let event = Event::structured(channel_id, bytes);
        self.client_data_event(channel_id, event)
    }

    fn client_data_event(&self, channel_id: ChannelId, event: Event) -> Result<(), RouterError> {
        let channel = {
            let mut inner = self.inner.lock();
            inner.last_activity_at = chrono::Utc::now();
            let window = inner.client_window_size as usize;
            let sub = inner
                .channels
                .get_mut(&channel_id)
                .ok_or_else(|| self.err_unknown_channel(channel_id))?;
            sub.touch();
            if sub.is_closed() {
                log::debug!(target: "session", "{} dropping client data for closed channel {}", self.session_id, channel_id);
                return Ok(());
            }
            if sub.is_blocked() {
                let queued_len = inner.blocked_queues.get(&channel_id).map(|q| q.len()).unwrap_or(0);
                if queued_len + 1 > window {
                    drop(inner);
                    self.request_disconnect();
                    return Err(RouterError::Resource(format!(
                        "channel {channel_id} blocked queue exceeded client window ({window}) while back-pressured"
                    )));
                }
                inner.blocked_queues.entry(channel_id).or_default().push_back(event);
                return Ok(());
            }
            sub.channel().clone()
        };

        match channel.send_item(event) {
            Ok(SendOutcome::Accepted) => Ok(()),
            Ok(SendOutcome::Blocked) => {
                log::debug!(target: "session", "{} channel {} blocked on client_data", self.session_id, channel_id);
                Ok(())
            }
            Ok(SendOutcome::Closed) => Err(RouterError::channel(channel_id, "channel is closed")),
            Err(e) => Err(e),
        }
    }

    /// Acknowledges every event sent to the client up through and
    /// including `serial_id`, releasing them from the resend buffer.
    ///
    /// `serial_id == 0` and a `serial_id` not present in `sent` are
    /// both protocol violations: the client is acking something it was
    /// never sent, so the session is disconnected rather than trusted
    /// further.
    pub fn client_ack(&self, serial_id: MessageSerialId) {
        let mut inner = self.inner.lock();
        if serial_id == MessageSerialId::NONE || !inner.sent.iter().any(|(id, _)| *id == serial_id) {
            drop(inner);
            log::warn!(target: "session", "{} acked unknown serial {}, disconnecting", self.session_id, serial_id);
            self.request_disconnect();
            return;
        }
        let dropped = apply_ack(&mut inner.sent, serial_id);
        inner.last_activity_at = chrono::Utc::now();
        log::trace!(target: "session", "{} acked through {} ({} entries released)", self.session_id, serial_id, dropped);
    }

    /// Acknowledges events as part of the reconnect handshake: the
    /// client reports the last serial id it fully processed before
    /// the old connection was lost. A `serial_id` of zero means the
    /// client kept no state across the reconnect, so everything still
    /// held in `sent` is retransmitted; otherwise this behaves like
    /// [`Session::client_ack`].
    pub fn client_ack_reconnect(&self, serial_id: MessageSerialId) {
        if serial_id == MessageSerialId::NONE {
            log::debug!(target: "session", "{} reconnect ack declares no retained state, resending all in-flight events", self.session_id);
            return;
        }
        self.client_ack(serial_id);
    }

    /// Notifies the session that its connection is no longer blocked
    /// and queued output should be flushed. Actual delivery happens on
    /// the next call to [`Session::service`].
    pub fn client_unblocked(&self) {
        let mut inner = self.inner.lock();
        inner.connection_blocked = false;
        log::trace!(target: "session", "{} connection unblocked", self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{Channel, ChannelKind};
    use crate::ids::{EntityId, SessionId};
    use crate::session::Session;
    use std::sync::Arc;

    struct StubChannel {
        blocked: std::sync::atomic::AtomicBool,
    }

    impl Channel for StubChannel {
        fn name(&self) -> &str {
            "input"
        }
        fn subtype(&self) -> &str {
            "test"
        }
        fn kind(&self) -> ChannelKind {
            ChannelKind::Text
        }
        fn send_item(&self, _event: Event) -> Result<SendOutcome, RouterError> {
            Ok(SendOutcome::Accepted)
        }
        fn is_blocked(&self) -> bool {
            self.blocked.load(std::sync::atomic::Ordering::Relaxed)
        }
        fn is_closed(&self) -> bool {
            false
        }
        fn close_channel(&self) {}
        fn register_control_listener(&self, _listener: Arc<dyn crate::channel::ChannelListener>) {}
        fn unregister_control_listener(&self) {}
    }

    #[test]
    fn client_data_queues_into_blocked_channel() {
        let session = Session::new(SessionId::from_raw(1), EntityId::new(1, 1), 4);
        let channel = Arc::new(StubChannel { blocked: std::sync::atomic::AtomicBool::new(true) });
        let channel_id = session.channel_added(channel.clone());
        // Mirrors Router::add_channel: the initial blocked check only
        // runs on the channel_added_notify callback, not on insertion.
        session.channel_added_notify(channel_id);

        session.client_data(channel_id, "hello").unwrap();

        let inner = session.inner.lock();
        assert_eq!(inner.blocked_queues.get(&channel_id).map(|q| q.len()), Some(1));
    }

    #[test]
    fn client_data_disconnects_once_blocked_queue_exceeds_window() {
        let session = Session::new(SessionId::from_raw(1), EntityId::new(1, 1), 2);
        let channel = Arc::new(StubChannel { blocked: std::sync::atomic::AtomicBool::new(true) });
        let channel_id = session.channel_added(channel);
        session.channel_added_notify(channel_id);

        session.client_data(channel_id, "a").unwrap();
        session.client_data(channel_id, "b").unwrap();
        let result = session.client_data(channel_id, "c");

        assert!(result.is_err());
    }

    #[test]
    fn client_data_on_unknown_channel_is_an_error() {
        let session = Session::new(SessionId::from_raw(1), EntityId::new(1, 1), 4);
        let result = session.client_data(ChannelId::from_raw(99), "hi");
        assert!(matches!(result, Err(RouterError::UnknownChannel(_))));
    }
}
