//! MQTT publisher on `rumqttc`.
//!
//! ```text
//!   publish() ──► AsyncClient ──► request channel ──► EventLoop task ──► broker
//!       ▲                                                   │
//!       └──────────── Delivery (written/acked/completed) ◄──┘
//! ```
//!
//! The event loop runs in a background task for the lifetime of the
//! publisher. It reports each outgoing write and broker acknowledgment back
//! to the waiting `publish` call, and keeps polling through connection loss
//! so the client reconnects on its own. It stops once DISCONNECT is sent.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use super::Publisher;
use crate::types::{BrokerConfig, Error, Result};

/// Capacity of the client → event loop request channel.
const REQUEST_CHANNEL_CAPACITY: usize = 16;

/// How long `disconnect` waits for the event loop to send DISCONNECT.
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Called after every successful (re)connection.
pub type ConnectHandler = Arc<dyn Fn() + Send + Sync>;
/// Called when the event loop loses the broker connection.
pub type ConnectionLostHandler = Arc<dyn Fn(&ConnectionError) + Send + Sync>;

/// Progress reported by the event loop task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    /// Publish packet written to the network (QoS 0 completion).
    Written,
    /// PUBACK received (QoS 1 completion).
    Acked,
    /// PUBCOMP received (QoS 2 completion).
    Completed,
    /// DISCONNECT sent; the event loop task stops after this.
    Disconnected,
}

impl Delivery {
    fn completing(qos: QoS) -> Self {
        match qos {
            QoS::AtMostOnce => Delivery::Written,
            QoS::AtLeastOnce => Delivery::Acked,
            QoS::ExactlyOnce => Delivery::Completed,
        }
    }
}

/// Map a numeric QoS level to the client enum.
pub fn qos_from_level(level: u8) -> Result<QoS> {
    match level {
        0 => Ok(QoS::AtMostOnce),
        1 => Ok(QoS::AtLeastOnce),
        2 => Ok(QoS::ExactlyOnce),
        other => Err(Error::config(format!("invalid MQTT QoS level: {other}"))),
    }
}

/// Builder carrying client options and connection lifecycle handlers.
pub struct MqttPublisherBuilder {
    options: MqttOptions,
    qos: QoS,
    reconnect_delay: Duration,
    on_connect: ConnectHandler,
    on_connection_lost: ConnectionLostHandler,
}

impl fmt::Debug for MqttPublisherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MqttPublisherBuilder")
            .field("broker", &self.options.broker_address())
            .field("client_id", &self.options.client_id())
            .field("qos", &self.qos)
            .field("reconnect_delay", &self.reconnect_delay)
            .finish_non_exhaustive()
    }
}

impl MqttPublisherBuilder {
    pub fn new(config: &BrokerConfig) -> Result<Self> {
        config.validate()?;

        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(config.keep_alive);
        if let Some(username) = &config.username {
            options.set_credentials(username, config.password.as_deref().unwrap_or_default());
        }

        Ok(Self {
            options,
            qos: qos_from_level(config.qos)?,
            reconnect_delay: config.reconnect_delay,
            on_connect: Arc::new(|| tracing::info!("Connected to MQTT broker")),
            on_connection_lost: Arc::new(|err: &ConnectionError| {
                tracing::warn!("MQTT connection lost: {}", err);
            }),
        })
    }

    /// Replace the handler run after each successful connection.
    pub fn on_connect<F>(mut self, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_connect = Arc::new(handler);
        self
    }

    /// Replace the handler run when the connection drops.
    pub fn on_connection_lost<F>(mut self, handler: F) -> Self
    where
        F: Fn(&ConnectionError) + Send + Sync + 'static,
    {
        self.on_connection_lost = Arc::new(handler);
        self
    }

    pub fn options(&self) -> &MqttOptions {
        &self.options
    }

    pub fn qos(&self) -> QoS {
        self.qos
    }

    /// Connect to the broker and start the event loop task.
    ///
    /// Fails with `Error::Connection` if the first connection attempt fails
    /// or the broker refuses it; there is no retry at startup.
    pub async fn connect(self) -> Result<MqttPublisher> {
        let (host, port) = self.options.broker_address();
        let (client, mut eventloop) = AsyncClient::new(self.options, REQUEST_CHANNEL_CAPACITY);

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => break,
                Ok(_) => continue,
                // A CONNACK with a non-success code surfaces here, not as a packet.
                Err(ConnectionError::ConnectionRefused(code)) => {
                    return Err(Error::connection(format!(
                        "broker {}:{} refused connection: {:?}",
                        host, port, code
                    )));
                }
                Err(e) => {
                    return Err(Error::connection(format!(
                        "cannot connect to broker {}:{}: {}",
                        host, port, e
                    )));
                }
            }
        }
        (self.on_connect)();

        let (tx, rx) = mpsc::unbounded_channel();
        let driver = tokio::spawn(drive_event_loop(
            eventloop,
            tx,
            self.on_connect,
            self.on_connection_lost,
            self.reconnect_delay,
        ));

        Ok(MqttPublisher {
            client,
            qos: self.qos,
            deliveries: Mutex::new(rx),
            driver,
        })
    }
}

/// Publisher backed by a connected MQTT client.
#[derive(Debug)]
pub struct MqttPublisher {
    client: AsyncClient,
    qos: QoS,
    deliveries: Mutex<mpsc::UnboundedReceiver<Delivery>>,
    driver: JoinHandle<()>,
}

impl MqttPublisher {
    pub fn builder(config: &BrokerConfig) -> Result<MqttPublisherBuilder> {
        MqttPublisherBuilder::new(config)
    }

    /// Send DISCONNECT and wait until the event loop task reports it sent.
    ///
    /// Waits at most `DISCONNECT_TIMEOUT`: while the connection is down the
    /// request is only sent after the client reconnects.
    pub async fn disconnect(self) -> Result<()> {
        self.client
            .disconnect()
            .await
            .map_err(|e| Error::publish(e.to_string()))?;

        let mut deliveries = self.deliveries.lock().await;
        let sent = tokio::time::timeout(DISCONNECT_TIMEOUT, async {
            while let Some(delivery) = deliveries.recv().await {
                if delivery == Delivery::Disconnected {
                    return true;
                }
            }
            false
        })
        .await;

        match sent {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::publish(
                "MQTT event loop stopped before DISCONNECT was sent",
            )),
            Err(_) => Err(Error::publish(format!(
                "DISCONNECT not sent within {:?}",
                DISCONNECT_TIMEOUT
            ))),
        }
    }
}

impl Drop for MqttPublisher {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        let mut deliveries = self.deliveries.lock().await;
        // Drop progress left over from earlier messages (e.g. the outgoing
        // write of a QoS 1 publish).
        while deliveries.try_recv().is_ok() {}

        self.client
            .publish(topic, self.qos, false, payload.as_bytes().to_vec())
            .await
            .map_err(|e| Error::publish(e.to_string()))?;

        let expected = Delivery::completing(self.qos);
        loop {
            match deliveries.recv().await {
                Some(delivery) if delivery == expected => return Ok(()),
                Some(_) => continue,
                None => return Err(Error::publish("MQTT event loop stopped")),
            }
        }
    }
}

async fn drive_event_loop(
    mut eventloop: EventLoop,
    tx: mpsc::UnboundedSender<Delivery>,
    on_connect: ConnectHandler,
    on_connection_lost: ConnectionLostHandler,
    reconnect_delay: Duration,
) {
    loop {
        let delivery = match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                on_connect();
                None
            }
            Ok(Event::Incoming(Packet::PubAck(_))) => Some(Delivery::Acked),
            Ok(Event::Incoming(Packet::PubComp(_))) => Some(Delivery::Completed),
            Ok(Event::Incoming(Packet::Publish(msg))) => {
                tracing::debug!(
                    "Received message: {} from topic: {}",
                    String::from_utf8_lossy(&msg.payload),
                    msg.topic
                );
                None
            }
            Ok(Event::Outgoing(Outgoing::Publish(_))) => Some(Delivery::Written),
            Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                tracing::debug!("MQTT disconnect sent");
                let _ = tx.send(Delivery::Disconnected);
                break;
            }
            Ok(_) => None,
            Err(e) => {
                on_connection_lost(&e);
                tokio::time::sleep(reconnect_delay).await;
                None
            }
        };

        if let Some(delivery) = delivery {
            if tx.send(delivery).is_err() {
                break;
            }
        }
    }
}
