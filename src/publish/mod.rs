//! Publisher boundary between the bridge loop and the broker.
//!
//! Implementations:
//! - [`MqttPublisher`]: MQTT broker via `rumqttc`
//! - [`ChannelPublisher`]: in-process tokio channel

pub mod channel;
pub mod mqtt;

pub use channel::{ChannelPublisher, Published};
pub use mqtt::{MqttPublisher, MqttPublisherBuilder};

use async_trait::async_trait;

use crate::types::Result;

/// Delivers payloads to a topic.
///
/// `publish` returns once the broker side has accepted the message. It does
/// not retry and imposes no timeout of its own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()>;
}
