//! Channel-backed publisher for tests and embedding.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::Publisher;
use crate::types::{Error, Result};

/// A message handed to [`ChannelPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: String,
}

/// Forwards every publish into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: mpsc::UnboundedSender<Published>,
}

impl ChannelPublisher {
    /// Create a publisher and the receiver that observes its messages.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Published>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Publisher for ChannelPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        self.tx
            .send(Published {
                topic: topic.to_string(),
                payload: payload.to_string(),
            })
            .map_err(|_| Error::publish("channel receiver dropped"))
    }
}
