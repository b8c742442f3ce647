use super::state::Session;
use crate::connection::SendReturnCode;

impl Session {
    /// Drains queued outgoing events to the attached connection, if
    /// any.
    ///
    /// This is the session's single-threaded service point: the
    /// router calls it once per scheduling turn for each session that
    /// [`Router::session_needs_service`](crate::router::Router::session_needs_service)
    /// reports as having work. Per the concurrency design, the
    /// session's internal lock is never held across the call into the
    /// connection — it is taken to pop the next queued event, released
    /// for the send itself, then reacquired to record the outcome.
    pub fn service(&self) {
        loop {
            let (serial, event, conn) = {
                let mut inner = self.inner.lock();
                if inner.connection_blocked || inner.outgoing.is_empty() {
                    break;
                }
                if inner.sent.len() >= inner.client_window_size as usize {
                    break;
                }
                let Some(conn) = inner.connection.clone() else { break };
                let Some((serial, event)) = inner.outgoing.pop_front() else { break };
                (serial, event, conn)
            };

            match conn.send_event(serial, &event) {
                SendReturnCode::Ok => {
                    let mut inner = self.inner.lock();
                    inner.sent.push_back((serial, event));
                }
                SendReturnCode::OkBlocked => {
                    let mut inner = self.inner.lock();
                    inner.sent.push_back((serial, event));
                    inner.connection_blocked = true;
                }
                SendReturnCode::Blocked => {
                    let mut inner = self.inner.lock();
                    inner.outgoing.push_front((serial, event));
                    inner.connection_blocked = true;
                    break;
                }
                SendReturnCode::Disconnected => {
                    drop(event);
                    self.connection_dropped();
                    break;
                }
                SendReturnCode::NotSupported => {
                    log::warn!(target: "session", "{} connection does not support event kind for serial {}, dropping", self.session_id, serial);
                }
            }
        }
    }

    /// True if this session has queued output or other pending work a
    /// router scheduling pass should drive via [`Session::service`].
    pub fn needs_service(&self) -> bool {
        let inner = self.inner.lock();
        inner.connection.is_some()
            && !inner.connection_blocked
            && !inner.outgoing.is_empty()
            && inner.sent.len() < inner.client_window_size as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ClientConnection;
    use crate::event::Event;
    use crate::ids::{ChannelId, EntityId, MessageSerialId, SessionId};
    use crate::sync::Mutex;
    use std::sync::Arc;

    struct RecordingConnection {
        sent: Mutex<Vec<MessageSerialId>>,
        reply: SendReturnCode,
    }

    impl ClientConnection for RecordingConnection {
        fn send_event(&self, serial_id: MessageSerialId, _event: &Event) -> SendReturnCode {
            self.sent.lock().push(serial_id);
            self.reply
        }

        fn request_disconnect(&self) {}

        fn is_connected(&self) -> bool {
            true
        }
    }

    #[test]
    fn service_drains_outgoing_queue_in_order() {
        let session = Session::new(SessionId::from_raw(1), EntityId::new(1, 1), 64);
        let conn = Arc::new(RecordingConnection { sent: Mutex::new(Vec::new()), reply: SendReturnCode::Ok });
        session.set_connection(conn.clone());

        session.queue_outgoing(ChannelId::from_raw(1), Event::plain_text(ChannelId::from_raw(1), "a"));
        session.queue_outgoing(ChannelId::from_raw(1), Event::plain_text(ChannelId::from_raw(1), "b"));

        session.service();

        let sent = conn.sent.lock();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].raw() < sent[1].raw());
    }

    #[test]
    fn service_stops_and_requeues_on_blocked() {
        let session = Session::new(SessionId::from_raw(1), EntityId::new(1, 1), 64);
        let conn = Arc::new(RecordingConnection { sent: Mutex::new(Vec::new()), reply: SendReturnCode::Blocked });
        session.set_connection(conn.clone());
        session.queue_outgoing(ChannelId::from_raw(1), Event::plain_text(ChannelId::from_raw(1), "a"));

        session.service();

        assert!(!session.needs_service());
        assert_eq!(conn.sent.lock().len(), 1);
    }

    #[test]
    fn service_holds_excess_events_once_window_is_saturated() {
        let session = Session::new(SessionId::from_raw(1), EntityId::new(1, 1), 4);
        let conn = Arc::new(RecordingConnection { sent: Mutex::new(Vec::new()), reply: SendReturnCode::Ok });
        session.set_connection(conn.clone());

        for i in 0..5 {
            session.queue_outgoing(ChannelId::from_raw(1), Event::plain_text(ChannelId::from_raw(1), format!("line {i}")));
        }

        session.service();

        assert_eq!(conn.sent.lock().len(), 4);
        assert!(!session.needs_service());

        session.client_ack(conn.sent.lock()[0]);
        assert!(session.needs_service());
        session.service();
        assert_eq!(conn.sent.lock().len(), 5);
    }
}
