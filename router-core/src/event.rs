//! The event envelope that carries data between channels and sessions.
//!
//! Mirrors the original's `RouterEvent`/`ChannelStatusChange` pair, but
//! as a single move-only tagged union rather than a base class with
//! subtypes: cloning an event is not meaningful (styled text segments
//! and structured payloads are both move-only), so `Event` is
//! intentionally not `Clone`.

use crate::ids::ChannelId;

/// A single SGR (Select Graphic Rendition) styled run of text.
///
/// The driver renders a sequence of these into ANSI escape sequences
/// when the client has color enabled, or drops the styling and
/// concatenates the text when it doesn't.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSegment {
    /// Raw text, already UTF-8, never containing a newline.
    pub text: String,
    /// Foreground color, if any (an ANSI SGR parameter, e.g. `31` for red).
    pub fg: Option<u8>,
    /// True if the segment should be rendered bold/bright.
    pub bold: bool,
}

impl StyledSegment {
    /// Builds a plain, unstyled segment.
    pub fn plain(text: impl Into<String>) -> Self {
        StyledSegment { text: text.into(), fg: None, bold: false }
    }
}

/// Direction a channel status change refers to: the direction data
/// flows between client and the entity that owns the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Channel carries data from the entity to the client.
    ToClient,
    /// Channel carries data from the client to the entity.
    FromClient,
    /// Channel carries data in both directions.
    Bidirectional,
}

/// A change in a channel's lifecycle or flow-control state, reported
/// to the client so it can update a status line or similar UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelStatusChange {
    /// A channel was added to the session.
    Open {
        /// The channel's id, unique within the session.
        channel_id: ChannelId,
        /// Human-readable channel name (e.g. the entity's name).
        name: String,
        /// Direction of data flow for this channel.
        direction: Direction,
    },
    /// A channel entered the flow-blocked state.
    Blocked {
        /// The blocked channel's id.
        channel_id: ChannelId,
    },
    /// A previously-blocked channel can accept data again.
    Unblocked {
        /// The unblocked channel's id.
        channel_id: ChannelId,
    },
    /// A channel was closed and removed from the session.
    Closed {
        /// The closed channel's id.
        channel_id: ChannelId,
    },
}

/// The payload carried by an [`Event`].
#[derive(Debug)]
pub enum EventPayload {
    /// Plain or styled text destined for the client's screen.
    Text(Vec<StyledSegment>),
    /// An application-defined structured message (e.g. JSON), opaque
    /// to the router.
    Structured(Vec<u8>),
    /// A channel lifecycle/flow-control notification.
    ChannelStatus(ChannelStatusChange),
    /// An empty payload; used for keepalive/ack-only events.
    Empty,
}

/// The move-only envelope that flows from a channel to a session, and
/// from a session out to the client.
///
/// `Event` is deliberately not `Clone`: a styled-text payload or a
/// structured blob is consumed exactly once, by exactly one session,
/// matching the single-consumer queue semantics described for
/// channels.
#[derive(Debug)]
pub struct Event {
    /// The channel this event originated from or is destined for.
    pub channel_id: ChannelId,
    /// The event's payload.
    pub payload: EventPayload,
}

impl Event {
    /// Builds a text event from already-styled segments.
    pub fn text(channel_id: ChannelId, segments: Vec<StyledSegment>) -> Self {
        Event { channel_id, payload: EventPayload::Text(segments) }
    }

    /// Builds a plain, unstyled text event from a single string.
    pub fn plain_text(channel_id: ChannelId, text: impl Into<String>) -> Self {
        Event::text(channel_id, vec![StyledSegment::plain(text)])
    }

    /// Builds a structured-message event.
    pub fn structured(channel_id: ChannelId, bytes: Vec<u8>) -> Self {
        Event { channel_id, payload: EventPayload::Structured(bytes) }
    }

    /// Builds a channel-status event.
    pub fn channel_status(change: ChannelStatusChange) -> Self {
        let channel_id = match &change {
            ChannelStatusChange::Open { channel_id, .. }
            | ChannelStatusChange::Blocked { channel_id }
            | ChannelStatusChange::Unblocked { channel_id }
            | ChannelStatusChange::Closed { channel_id } => *channel_id,
        };
        Event { channel_id, payload: EventPayload::ChannelStatus(change) }
    }

    /// Returns the channel-status payload if this event carries one.
    pub fn payload_as_channel_status(&self) -> Option<&ChannelStatusChange> {
        match &self.payload {
            EventPayload::ChannelStatus(c) => Some(c),
            _ => None,
        }
    }

    /// Releases the event, returning its payload and discarding the
    /// envelope. Named to mirror the "move, don't copy" contract: once
    /// released, the caller owns the payload outright.
    pub fn release(self) -> EventPayload {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_round_trips_single_segment() {
        let ev = Event::plain_text(ChannelId::from_raw(1), "hello");
        match ev.payload {
            EventPayload::Text(segs) => {
                assert_eq!(segs.len(), 1);
                assert_eq!(segs[0].text, "hello");
                assert!(!segs[0].bold);
            }
            _ => panic!("expected text payload"),
        }
    }

    #[test]
    fn channel_status_extracts_channel_id_from_each_variant() {
        let id = ChannelId::from_raw(7);
        let ev = Event::channel_status(ChannelStatusChange::Blocked { channel_id: id });
        assert_eq!(ev.channel_id, id);
        assert!(ev.payload_as_channel_status().is_some());
    }
}
