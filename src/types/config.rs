//! Configuration structures.
//!
//! Configuration is loaded from an optional JSON file, then overridden by
//! command-line flags and environment variables in the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::errors::{Error, Result};

/// Global bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// MQTT broker configuration.
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Telldus hub event socket configuration.
    #[serde(default)]
    pub hub: HubConfig,

    /// Translation loop configuration.
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load a JSON configuration file. Missing sections take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read {}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    /// Reject values the bridge cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.broker.validate()?;
        if self.hub.read_buffer_bytes == 0 {
            return Err(Error::config("hub.read_buffer_bytes must be positive"));
        }
        let topic = &self.bridge.topic;
        if topic.is_empty() {
            return Err(Error::config("bridge.topic cannot be empty"));
        }
        if topic.contains(['#', '+']) {
            return Err(Error::config(format!(
                "bridge.topic {topic:?} cannot contain MQTT wildcards"
            )));
        }
        Ok(())
    }
}

/// MQTT broker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Broker host name or address.
    pub host: String,

    /// Broker TCP port.
    pub port: u16,

    /// MQTT client identifier.
    pub client_id: String,

    pub username: Option<String>,

    pub password: Option<String>,

    /// MQTT keep-alive interval.
    #[serde(with = "humantime_serde")]
    pub keep_alive: Duration,

    /// Pause between reconnect attempts after the connection drops.
    #[serde(with = "humantime_serde")]
    pub reconnect_delay: Duration,

    /// Delivery guarantee level (0, 1 or 2).
    pub qos: u8,
}

impl BrokerConfig {
    /// Reject broker settings the MQTT client cannot be built from.
    ///
    /// Owns the broker rules; `Config::validate` and `MqttPublisher::builder`
    /// both call it. The client options panic on a bad client id or
    /// keep-alive, so nothing reaches them unchecked.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::config("broker.host cannot be empty"));
        }
        if self.port == 0 {
            return Err(Error::config("broker.port must be positive"));
        }
        if self.client_id.is_empty() || self.client_id.starts_with(' ') {
            return Err(Error::config(format!(
                "broker.client_id is invalid: {:?}",
                self.client_id
            )));
        }
        if self.keep_alive < Duration::from_secs(5) {
            return Err(Error::config("broker.keep_alive must be at least 5s"));
        }
        if self.qos > 2 {
            return Err(Error::config(format!(
                "broker.qos must be 0, 1 or 2, got {}",
                self.qos
            )));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(Error::config("broker.password requires broker.username"));
        }
        Ok(())
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "telldusbridge".to_string(),
            username: None,
            password: None,
            keep_alive: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(5),
            qos: 0,
        }
    }
}

/// Telldus hub event socket configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Path of the hub's Unix event socket.
    pub socket_path: PathBuf,

    /// Size of the buffer for a single socket read. One read is one event.
    pub read_buffer_bytes: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/tmp/TelldusEvents"),
            read_buffer_bytes: 512,
        }
    }
}

/// What the loop does with an event carrying a field without `:`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Log the event and continue with the next read.
    #[default]
    Skip,
    /// Stop the loop and return the error.
    Abort,
}

/// Translation loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Topic both payload forms are published to.
    pub topic: String,

    pub on_malformed: MalformedPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            topic: "telldus/event".to_string(),
            on_malformed: MalformedPolicy::Skip,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Tracing log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable JSON log formatting.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}
