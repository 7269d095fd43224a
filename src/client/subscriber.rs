use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::api::ClientError;
use crate::event::ChannelMessage;

/// Client side of the pub/sub collaborator
#[async_trait]
pub trait ChannelSubscriber: Send + Sync {
    async fn subscribe(&self, channel: &str) -> Result<Subscription, ClientError>;
}

/// A live channel subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    channel: String,
    receiver: mpsc::Receiver<ChannelMessage>,
    forwarder: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(
        channel: &str,
        receiver: mpsc::Receiver<ChannelMessage>,
        forwarder: JoinHandle<()>,
    ) -> Self {
        Self {
            channel: channel.to_string(),
            receiver,
            forwarder: Some(forwarder),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Next message, or `None` once the channel is gone
    pub async fn recv(&mut self) -> Option<ChannelMessage> {
        self.receiver.recv().await
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
    }
}
