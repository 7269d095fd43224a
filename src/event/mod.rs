//! Room change notifications
//!
//! Services publish through [`Notifier`] after a commit; [`EventHub`] is the
//! in-process implementation and also feeds the SSE endpoint and in-process
//! client subscribers.

pub mod handler;
pub mod hub;
pub mod notifier;

mod event_types;

pub use event_types::{room_channel, ChannelMessage, RoomEvent};
pub use hub::EventHub;
pub use notifier::{notify_room, Notifier, PublishError};
