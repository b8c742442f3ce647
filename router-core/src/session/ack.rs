use crate::event::Event;
use crate::ids::MessageSerialId;
use std::collections::VecDeque;

/// Drops every entry in `sent` whose serial id is acknowledged by
/// `acked_through` (inclusive), accounting for 32-bit wraparound.
///
/// Returns the number of entries dropped, for logging.
pub(super) fn apply_ack(
    sent: &mut VecDeque<(MessageSerialId, Event)>,
    acked_through: MessageSerialId,
) -> usize {
    let mut dropped = 0;
    while let Some((id, _)) = sent.front() {
        if id.precedes_or_eq(acked_through) {
            sent.pop_front();
            dropped += 1;
        } else {
            break;
        }
    }
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ChannelId;

    fn ev() -> Event {
        Event::plain_text(ChannelId::from_raw(1), "x")
    }

    #[test]
    fn ack_drops_entries_up_to_and_including_acked_id() {
        let mut sent = VecDeque::new();
        sent.push_back((MessageSerialId::from_raw(1), ev()));
        sent.push_back((MessageSerialId::from_raw(2), ev()));
        sent.push_back((MessageSerialId::from_raw(3), ev()));
        let dropped = apply_ack(&mut sent, MessageSerialId::from_raw(2));
        assert_eq!(dropped, 2);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent.front().unwrap().0, MessageSerialId::from_raw(3));
    }

    #[test]
    fn ack_of_nothing_new_drops_nothing() {
        let mut sent = VecDeque::new();
        sent.push_back((MessageSerialId::from_raw(5), ev()));
        let dropped = apply_ack(&mut sent, MessageSerialId::from_raw(2));
        assert_eq!(dropped, 0);
        assert_eq!(sent.len(), 1);
    }
}
