//! Identifier types used throughout the router.
//!
//! Channel ids and serial ids are both bounded cyclic counters: the
//! original implementation hands them out from a wrapping 32-bit
//! counter so that a long-lived session never runs out, and reserves
//! one sentinel value to mean "none". Both invariants are encoded in
//! the allocator methods here rather than left to callers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Upper bound (exclusive) for a valid channel id. Channel ids are
/// allocated from `[1, MAX_CHANNEL_ID)`; `0` means "no channel".
pub const MAX_CHANNEL_ID: u32 = u32::MAX;

/// Opaque handle identifying a session for the lifetime of the process.
///
/// Sessions are never reused across reconnects or disconnects: a new
/// connection that successfully reconnects keeps its existing
/// `SessionId`, but a session that is destroyed never hands its id to
/// a later session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(u64);

impl SessionId {
    /// Wraps a raw id. Only the router's allocator should call this
    /// outside of tests.
    pub fn from_raw(raw: u64) -> Self {
        SessionId(raw)
    }

    /// Returns the raw numeric value, for logging and admin surfaces.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Monotonic allocator for [`SessionId`]s, shared by the router.
#[derive(Debug, Default)]
pub struct SessionIdAllocator {
    next: AtomicU32,
    epoch: AtomicU32,
}

impl SessionIdAllocator {
    /// Allocates the next `SessionId`. IDs never repeat within a
    /// process lifetime; the low 32 bits wrap into a new epoch rather
    /// than reusing id `0`.
    pub fn allocate(&self) -> SessionId {
        let low = self.next.fetch_add(1, Ordering::Relaxed);
        let epoch = if low == u32::MAX {
            self.epoch.fetch_add(1, Ordering::Relaxed) + 1
        } else {
            self.epoch.load(Ordering::Relaxed)
        };
        SessionId::from_raw(((epoch as u64) << 32) | (low as u64 + 1))
    }
}

/// Identifies a channel within the scope of a single session.
///
/// Valid values are `[1, MAX_CHANNEL_ID)`. `ChannelId::NONE` (`0`) is a
/// sentinel meaning "no channel" and is never handed out by
/// [`ChannelIdAllocator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(u32);

impl ChannelId {
    /// Sentinel value meaning "no channel".
    pub const NONE: ChannelId = ChannelId(0);

    /// Wraps a raw value without validating range; used by the
    /// allocator and by tests constructing fixtures.
    pub fn from_raw(raw: u32) -> Self {
        ChannelId(raw)
    }

    /// Returns the raw numeric value.
    pub fn raw(self) -> u32 {
        self.0
    }

    /// True when this is the `NONE` sentinel.
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel#{}", self.0)
    }
}

/// Per-session allocator for [`ChannelId`]s. Wraps around before
/// reaching [`MAX_CHANNEL_ID`], skipping `0`.
#[derive(Debug)]
pub struct ChannelIdAllocator {
    next: u32,
}

impl Default for ChannelIdAllocator {
    fn default() -> Self {
        ChannelIdAllocator { next: 1 }
    }
}

impl ChannelIdAllocator {
    /// Allocates the next channel id for a session, wrapping past the
    /// `0` sentinel and past [`MAX_CHANNEL_ID`].
    pub fn allocate(&mut self) -> ChannelId {
        let id = self.next;
        self.next = if self.next >= MAX_CHANNEL_ID - 1 {
            1
        } else {
            self.next + 1
        };
        ChannelId::from_raw(id)
    }
}

/// A 32-bit cyclic serial number attached to outgoing client data so
/// the client can acknowledge exactly what it has received.
///
/// `0` is reserved and never allocated; wraparound skips it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageSerialId(u32);

impl MessageSerialId {
    /// The reserved "no serial id" value.
    pub const NONE: MessageSerialId = MessageSerialId(0);

    /// Wraps a raw value.
    pub fn from_raw(raw: u32) -> Self {
        MessageSerialId(raw)
    }

    /// Returns the raw numeric value.
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Returns the next serial id in cyclic order, skipping `0`.
    pub fn next(self) -> MessageSerialId {
        if self.0 == u32::MAX {
            MessageSerialId(1)
        } else {
            let n = self.0 + 1;
            MessageSerialId(if n == 0 { 1 } else { n })
        }
    }

    /// Returns true if `self` is sequenced at or before `other` in
    /// cyclic order, treating the 32-bit space as a ring split in
    /// half around `self`. Used by the ack window to decide whether a
    /// client has acknowledged up through a given point.
    pub fn precedes_or_eq(self, other: MessageSerialId) -> bool {
        let diff = other.0.wrapping_sub(self.0);
        diff < u32::MAX / 2
    }
}

impl fmt::Display for MessageSerialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies an entity (player, object, room) within a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    site_id: u32,
    entity_number: u64,
}

impl EntityId {
    /// Constructs an `EntityId` from its two components.
    pub fn new(site_id: u32, entity_number: u64) -> Self {
        EntityId { site_id, entity_number }
    }

    /// The site (shard/world) this entity belongs to.
    pub fn site_id(self) -> u32 {
        self.site_id
    }

    /// The entity's number within its site.
    pub fn entity_number(self) -> u64 {
        self.entity_number
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.site_id, self.entity_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_id_allocator_skips_none() {
        let mut alloc = ChannelIdAllocator::default();
        for i in 1..=5 {
            assert_eq!(alloc.allocate().raw(), i);
        }
    }

    #[test]
    fn channel_id_allocator_wraps_past_max_skipping_zero() {
        let mut alloc = ChannelIdAllocator { next: MAX_CHANNEL_ID - 1 };
        let last = alloc.allocate();
        assert_eq!(last.raw(), MAX_CHANNEL_ID - 1);
        let wrapped = alloc.allocate();
        assert_eq!(wrapped.raw(), 1);
    }

    #[test]
    fn serial_id_next_skips_zero_on_wrap() {
        let id = MessageSerialId::from_raw(u32::MAX);
        assert_eq!(id.next(), MessageSerialId::from_raw(1));
    }

    #[test]
    fn serial_id_precedes_handles_wraparound() {
        let a = MessageSerialId::from_raw(u32::MAX - 1);
        let b = a.next();
        assert!(a.precedes_or_eq(b));
    }

    #[test]
    fn session_id_allocator_never_repeats() {
        let alloc = SessionIdAllocator::default();
        let a = alloc.allocate();
        let b = alloc.allocate();
        assert_ne!(a, b);
    }
}
