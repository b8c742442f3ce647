//! Back-pressure ack heuristic.
//!
//! Rather than acknowledging every line, the driver batches: it tracks
//! how many bytes of unacknowledged output have accumulated since the
//! last ack request and asks the client to acknowledge once that
//! crosses a soft target. A client that sends many *small* lines
//! (chatty, low-byte-count traffic) would otherwise never cross the
//! byte target and could accumulate an unbounded number of
//! unacknowledged serial ids, so a secondary line-count trigger fires
//! after 5 lines regardless of size — and halves the byte target
//! going forward, since hitting the line trigger is itself a signal
//! that this connection's traffic doesn't suit the current target.
use router_core::ids::MessageSerialId;

/// Default number of accumulated lines that forces an ack request
/// even if the byte target hasn't been reached.
const LINE_TRIGGER: usize = 5;

/// Tracks unacknowledged output for one connection and decides when
/// to request an ack from the client.
pub struct AckWindow {
    target_bytes: usize,
    pending_ids: Vec<MessageSerialId>,
    pending_bytes: usize,
}

impl AckWindow {
    /// Builds a window starting at the given soft byte target
    /// (typically `RouterConfig::target_pending_ack_bytes`).
    pub fn new(target_bytes: usize) -> Self {
        AckWindow { target_bytes: target_bytes.max(1), pending_ids: Vec::new(), pending_bytes: 0 }
    }

    /// Records that `serial_id` was just sent, `encoded_len` bytes on
    /// the wire. Returns true if the driver should request an ack
    /// now, in which case the window's pending state has already been
    /// cleared.
    pub fn record_sent(&mut self, serial_id: MessageSerialId, encoded_len: usize) -> bool {
        self.pending_ids.push(serial_id);
        self.pending_bytes += encoded_len;

        if self.pending_bytes >= self.target_bytes {
            self.flush_for_ack();
            return true;
        }

        if self.pending_ids.len() >= LINE_TRIGGER {
            self.target_bytes = (self.target_bytes / 2).max(1);
            log::debug!(target: "window", "line trigger fired, halving ack target to {}", self.target_bytes);
            self.flush_for_ack();
            return true;
        }

        false
    }

    /// Called when the client acks out of band (e.g. after an idle
    /// period) — clears pending state without touching the target.
    pub fn clear(&mut self) {
        self.pending_ids.clear();
        self.pending_bytes = 0;
    }

    fn flush_for_ack(&mut self) {
        self.pending_ids.clear();
        self.pending_bytes = 0;
    }

    /// The current soft byte target.
    pub fn target_bytes(&self) -> usize {
        self.target_bytes
    }

    /// Number of sent-but-unacknowledged serial ids currently tracked.
    pub fn pending_count(&self) -> usize {
        self.pending_ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_target_triggers_ack_request() {
        let mut window = AckWindow::new(100);
        assert!(!window.record_sent(MessageSerialId::from_raw(1), 60));
        assert!(window.record_sent(MessageSerialId::from_raw(2), 60));
        assert_eq!(window.pending_count(), 0);
    }

    #[test]
    fn line_trigger_fires_and_halves_target() {
        let mut window = AckWindow::new(10_000);
        for i in 1..5 {
            assert!(!window.record_sent(MessageSerialId::from_raw(i), 1));
        }
        assert!(window.record_sent(MessageSerialId::from_raw(5), 1));
        assert_eq!(window.target_bytes(), 5_000);
        assert_eq!(window.pending_count(), 0);
    }
}
