//! In-process pub/sub hub with one broadcast channel per room

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, Mutex};
use tracing::{debug, warn};

use super::event_types::ChannelMessage;
use super::notifier::{Notifier, PublishError};
use crate::client::{ChannelSubscriber, ClientError, Subscription};

#[derive(Clone)]
pub struct EventHub {
    inner: Arc<Mutex<HashMap<String, RoomChannel>>>,
    capacity: usize,
}

impl fmt::Debug for EventHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("capacity", &self.capacity)
            .finish()
    }
}

struct RoomChannel {
    sender: broadcast::Sender<ChannelMessage>,
    next_sequence: u64,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Raw broadcast receiver, used by the SSE endpoint
    pub async fn subscribe_channel(&self, channel: &str) -> broadcast::Receiver<ChannelMessage> {
        let mut guard = self.inner.lock().await;
        // Channels that never see another broadcast are pruned here
        guard.retain(|name, room_channel| {
            name == channel || room_channel.sender.receiver_count() > 0
        });
        let entry = guard
            .entry(channel.to_string())
            .or_insert_with(|| RoomChannel {
                sender: broadcast::channel(self.capacity).0,
                next_sequence: 0,
            });
        entry.sender.subscribe()
    }

    /// Stamp and broadcast an event. Returns the number of receivers reached.
    pub async fn broadcast(
        &self,
        channel: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> usize {
        let mut guard = self.inner.lock().await;
        let Some(room_channel) = guard.get_mut(channel) else {
            debug!(channel = %channel, event = %event, "No subscribers; event dropped");
            return 0;
        };

        let message = ChannelMessage {
            channel: channel.to_string(),
            event: event.to_string(),
            sequence: room_channel.next_sequence,
            payload,
        };
        room_channel.next_sequence = room_channel.next_sequence.saturating_add(1);

        let delivered = room_channel.sender.send(message).unwrap_or(0);

        // Last subscriber is gone
        if room_channel.sender.receiver_count() == 0 {
            guard.remove(channel);
        }

        delivered
    }

    pub async fn subscriber_count(&self, channel: &str) -> usize {
        self.inner
            .lock()
            .await
            .get(channel)
            .map(|c| c.sender.receiver_count())
            .unwrap_or(0)
    }

    pub async fn channel_count(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[async_trait]
impl Notifier for EventHub {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), PublishError> {
        self.broadcast(channel, event, payload).await;
        Ok(())
    }
}

#[async_trait]
impl ChannelSubscriber for EventHub {
    async fn subscribe(&self, channel: &str) -> Result<Subscription, ClientError> {
        let mut receiver = self.subscribe_channel(channel).await;
        let (tx, rx) = mpsc::channel(self.capacity);
        let channel_name = channel.to_string();

        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(message) => {
                        if tx.send(message).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(channel = %channel_name, skipped, "Subscriber lagged behind");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        Ok(Subscription::new(channel, rx, task))
    }
}
