//! Publishing seam between the services and the delivery network

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error};

use super::event_types::{room_channel, RoomEvent};

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("channel {0} is unavailable")]
    ChannelUnavailable(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Publishes named events to a channel
///
/// Delivery is at-least-once and ordered per channel. Callers treat a
/// failure as a lost notification, never as a failed mutation.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), PublishError>;
}

/// Announce a committed room change. Must only be called after the commit.
pub async fn notify_room(notifier: &dyn Notifier, room_id: &str, event: RoomEvent) {
    let channel = room_channel(room_id);
    let payload = json!({ "roomId": room_id });

    match notifier.publish(&channel, event.name(), payload).await {
        Ok(()) => debug!(channel = %channel, event = %event, "Room event published"),
        Err(e) => error!(
            channel = %channel,
            event = %event,
            error = %e,
            "Failed to publish room event"
        ),
    }
}
