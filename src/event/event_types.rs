//! Room event catalogue and the message shape carried on a channel

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named change notifications published on a room channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoomEvent {
    ParticipantJoined,
    ParticipantLeft,
    VoteUpdate,
    VoteReset,
    VoteVisibilityToggle,
    /// Room was deleted or soft-deleted; subscribers should leave the view
    RoomClosed,
}

impl RoomEvent {
    pub const ALL: [RoomEvent; 6] = [
        RoomEvent::ParticipantJoined,
        RoomEvent::ParticipantLeft,
        RoomEvent::VoteUpdate,
        RoomEvent::VoteReset,
        RoomEvent::VoteVisibilityToggle,
        RoomEvent::RoomClosed,
    ];

    /// Wire name of the event
    pub const fn name(&self) -> &'static str {
        match self {
            RoomEvent::ParticipantJoined => "participant-joined",
            RoomEvent::ParticipantLeft => "participant-left",
            RoomEvent::VoteUpdate => "vote-update",
            RoomEvent::VoteReset => "vote-reset",
            RoomEvent::VoteVisibilityToggle => "vote-visibility-toggle",
            RoomEvent::RoomClosed => "room-closed",
        }
    }
}

impl fmt::Display for RoomEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RoomEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoomEvent::ALL
            .into_iter()
            .find(|event| event.name() == s)
            .ok_or_else(|| format!("unknown room event: {}", s))
    }
}

/// Channel name for a room
pub fn room_channel(room_id: &str) -> String {
    format!("room-{}", room_id)
}

/// A published event as delivered to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMessage {
    pub channel: String,
    pub event: String,
    /// Monotonic within a channel while it has subscribers
    pub sequence: u64,
    pub payload: serde_json::Value,
}

impl ChannelMessage {
    /// Parsed event name, `None` for events outside the room catalogue
    pub fn room_event(&self) -> Option<RoomEvent> {
        self.event.parse().ok()
    }
}
