//! The channel interface a session consumes.
//!
//! `Channel` is an external dependency per the component design: this
//! crate only defines the trait boundary a concrete channel
//! implementation (owned by whatever embeds the router) must satisfy.
//! `ChannelListener` is the matching callback interface a `Session`
//! implements so a channel can notify it of flow-control and lifecycle
//! events without the channel needing to know about sockets at all.

use crate::error::RouterError;
use crate::event::Event;
use crate::ids::ChannelId;
use std::sync::Arc;

/// What kind of payload a channel carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    /// Plain or styled text.
    Text,
    /// Opaque structured/binary messages.
    Structured,
}

/// Outcome of attempting to hand an item to a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The item was accepted.
    Accepted,
    /// The channel is currently blocked; the item was not accepted
    /// and the caller should hold it and retry once unblocked.
    Blocked,
    /// The channel is closed and will never accept another item.
    Closed,
}

/// A named, directional conduit between an entity and a session.
///
/// Channels are owned and driven by whatever embeds the router (the
/// game/application layer); the router only ever holds a reference to
/// one through this trait.
pub trait Channel: Send + Sync {
    /// The channel's human-readable name (e.g. an entity's name).
    fn name(&self) -> &str;

    /// A free-form subtype string the application uses to distinguish
    /// channel purposes (e.g. `"puppet"`, `"room"`).
    fn subtype(&self) -> &str;

    /// What kind of payload this channel carries.
    fn kind(&self) -> ChannelKind;

    /// Hands an item to the channel for delivery to its entity.
    /// Returns whether the channel accepted it.
    fn send_item(&self, event: Event) -> Result<SendOutcome, RouterError>;

    /// True if the channel is currently refusing new items.
    fn is_blocked(&self) -> bool;

    /// True if the channel has been permanently closed.
    fn is_closed(&self) -> bool;

    /// Requests that the channel close. Idempotent.
    fn close_channel(&self);

    /// Registers the listener (the session that subscribed to this
    /// channel) to receive flow-control and data callbacks. A channel
    /// holds at most one listener at a time; registering a new one
    /// replaces the previous registration.
    fn register_control_listener(&self, listener: Arc<dyn ChannelListener>);

    /// Removes whatever listener is currently registered, if any.
    fn unregister_control_listener(&self);
}

/// Callback interface a [`Session`](crate::session::Session) provides
/// so the channels it's subscribed to can notify it of lifecycle and
/// flow-control changes.
///
/// All methods take `&self` (interior mutability is the session's
/// concern) so a channel can hold a listener handle without knowing
/// about the session's locking discipline.
pub trait ChannelListener: Send + Sync {
    /// Called once, when a channel is successfully subscribed.
    fn channel_added(&self, channel_id: ChannelId);

    /// Called when a previously-writable channel becomes blocked.
    fn channel_flow_blocked(&self, channel_id: ChannelId);

    /// Called when a previously-blocked channel becomes writable
    /// again.
    fn channel_flow_open(&self, channel_id: ChannelId);

    /// Called when a channel is closed by its owner (not by the
    /// session requesting it).
    fn channel_flow_closed(&self, channel_id: ChannelId);

    /// Called exactly once, when the channel object itself is being
    /// torn down; after this call the session must not reference the
    /// channel again.
    fn channel_destructed(&self, channel_id: ChannelId);

    /// Delivers an item originating from the channel, destined for
    /// the client.
    fn text_channel_data(&self, channel_id: ChannelId, event: Event);

    /// Delivers a structured item originating from the channel.
    fn client_channel_data(&self, channel_id: ChannelId, event: Event);
}
