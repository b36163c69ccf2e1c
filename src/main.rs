//! Telldus bridge - main entry point.
//!
//! Connects to the MQTT broker, then to the hub event socket, and forwards
//! events until the socket closes.

use std::path::PathBuf;

use clap::Parser;
use telldus_bridge::ipc::Bridge;
use telldus_bridge::publish::MqttPublisher;
use telldus_bridge::types::MalformedPolicy;
use telldus_bridge::{Config, Result};

/// Forward Telldus hub events to an MQTT broker.
#[derive(Debug, Parser)]
#[command(name = "telldus-bridge", version, about)]
struct Args {
    /// JSON configuration file; flags and env vars override it.
    #[arg(long, env = "TELLDUS_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// MQTT broker host.
    #[arg(long, env = "TELLDUS_BRIDGE_HOST")]
    host: Option<String>,

    /// MQTT broker port.
    #[arg(long, env = "TELLDUS_BRIDGE_PORT")]
    port: Option<u16>,

    /// MQTT client identifier.
    #[arg(long, env = "TELLDUS_BRIDGE_CLIENT_ID")]
    client_id: Option<String>,

    #[arg(long, env = "TELLDUS_BRIDGE_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "TELLDUS_BRIDGE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Path of the hub event socket.
    #[arg(long, env = "TELLDUS_BRIDGE_SOCKET")]
    socket: Option<PathBuf>,

    /// Topic events are published to.
    #[arg(long, env = "TELLDUS_BRIDGE_TOPIC")]
    topic: Option<String>,

    /// MQTT QoS level (0, 1 or 2).
    #[arg(long, env = "TELLDUS_BRIDGE_QOS")]
    qos: Option<u8>,

    /// What to do with events carrying a field without ':'.
    #[arg(long, value_enum, env = "TELLDUS_BRIDGE_ON_MALFORMED")]
    on_malformed: Option<MalformedPolicy>,

    /// Log level when RUST_LOG is unset.
    #[arg(long, env = "TELLDUS_BRIDGE_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    /// Merge flags over the config file (or defaults) and validate.
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        let broker = &mut config.broker;
        if let Some(host) = self.host {
            broker.host = host;
        }
        if let Some(port) = self.port {
            broker.port = port;
        }
        if let Some(client_id) = self.client_id {
            broker.client_id = client_id;
        }
        if self.username.is_some() {
            broker.username = self.username;
        }
        if self.password.is_some() {
            broker.password = self.password;
        }
        if let Some(qos) = self.qos {
            broker.qos = qos;
        }
        if let Some(socket) = self.socket {
            config.hub.socket_path = socket;
        }
        if let Some(topic) = self.topic {
            config.bridge.topic = topic;
        }
        if let Some(policy) = self.on_malformed {
            config.bridge.on_malformed = policy;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Args::parse().into_config()?;

    // Initialize observability
    telldus_bridge::observability::init_tracing(&config.observability);

    tracing::info!(
        "Starting telldus-bridge: {} -> {}:{} topic {}",
        config.hub.socket_path.display(),
        config.broker.host,
        config.broker.port,
        config.bridge.topic,
    );

    // Broker first: a bridge without a broker has nowhere to send events.
    let publisher = MqttPublisher::builder(&config.broker)?.connect().await?;

    let mut bridge = Bridge::new(
        publisher,
        config.bridge.clone(),
        config.hub.read_buffer_bytes,
    );
    let result = bridge.run_socket(&config.hub.socket_path).await;

    if let Err(e) = bridge.into_publisher().disconnect().await {
        tracing::debug!("MQTT disconnect failed: {}", e);
    }

    result?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = Args::parse_from([
            "telldus-bridge",
            "--host",
            "mqtt.lan",
            "--username",
            "telldus",
            "--password",
            "secret",
            "--socket",
            "/run/telldus/events",
            "--on-malformed",
            "abort",
        ]);
        let config = args.into_config().unwrap();
        assert_eq!(config.broker.host, "mqtt.lan");
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.broker.password.as_deref(), Some("secret"));
        assert_eq!(config.hub.socket_path, PathBuf::from("/run/telldus/events"));
        assert_eq!(config.bridge.on_malformed, MalformedPolicy::Abort);
    }

    #[test]
    fn test_invalid_flags_rejected() {
        let args = Args::parse_from(["telldus-bridge", "--qos", "5"]);
        assert!(args.into_config().is_err());
    }

    #[test]
    fn test_args_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
