//! Bridge loop — read → translate → publish, one notification at a time.
//!
//! ```text
//!  Connecting ──socket + broker up──► Streaming ──EOF / read error──► Terminated
//!                                      │    ▲
//!                                      └────┘ one event per iteration
//! ```
//!
//! Each payload is published and acknowledged before the next one is sent,
//! and before the next read. A stalled broker stalls intake.

use std::path::Path;

use serde::Serialize;
use tokio::io::AsyncRead;

use crate::events;
use crate::ipc::reader::{connect_socket, EventReader};
use crate::publish::Publisher;
use crate::types::{BridgeConfig, Error, MalformedPolicy, Result};

/// Lifecycle of a bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Connecting,
    Streaming,
    Terminated,
}

/// Counters reported when the loop ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BridgeStats {
    /// Notifications read from the socket.
    pub events: u64,
    /// Payloads accepted by the publisher.
    pub published: u64,
    /// Notifications dropped under the skip policy.
    pub skipped: u64,
}

/// Forwards hub notifications to a [`Publisher`].
#[derive(Debug)]
pub struct Bridge<P> {
    publisher: P,
    config: BridgeConfig,
    read_buffer_bytes: usize,
    state: BridgeState,
}

impl<P: Publisher> Bridge<P> {
    pub fn new(publisher: P, config: BridgeConfig, read_buffer_bytes: usize) -> Self {
        Self {
            publisher,
            config,
            read_buffer_bytes,
            state: BridgeState::Connecting,
        }
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn into_publisher(self) -> P {
        self.publisher
    }

    /// Connect to the hub socket and stream until it closes.
    pub async fn run_socket(&mut self, path: impl AsRef<Path>) -> Result<BridgeStats> {
        let path = path.as_ref();
        let stream = match connect_socket(path).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(code = e.code(), "Hub socket unavailable: {}", e);
                self.state = BridgeState::Terminated;
                return Err(e);
            }
        };
        tracing::info!("Connected to hub socket {}", path.display());
        self.run(stream).await
    }

    /// Stream notifications from `reader` until EOF or a read error.
    ///
    /// Returns `Err` only for publish failures and, under
    /// [`MalformedPolicy::Abort`], malformed fields.
    pub async fn run<R: AsyncRead + Unpin>(&mut self, reader: R) -> Result<BridgeStats> {
        let mut reader = EventReader::new(reader, self.read_buffer_bytes);
        let mut stats = BridgeStats::default();
        self.transition(BridgeState::Streaming);

        let result = loop {
            let raw = match reader.next_event().await {
                Ok(Some(raw)) => raw,
                Ok(None) => {
                    tracing::info!("Hub socket closed");
                    break Ok(stats);
                }
                Err(e) => {
                    tracing::warn!("Hub socket read failed: {}", e);
                    break Ok(stats);
                }
            };

            stats.events += 1;
            tracing::debug!("Received: {}", raw);

            if let Err(e) = self.forward(&raw, &mut stats).await {
                break Err(e);
            }
        };

        self.transition(BridgeState::Terminated);
        if let Ok(stats) = &result {
            tracing::info!(
                events = stats.events,
                published = stats.published,
                skipped = stats.skipped,
                "Bridge stopped"
            );
        }
        result
    }

    /// Translate one notification and publish its payloads in order.
    async fn forward(&self, raw: &str, stats: &mut BridgeStats) -> Result<()> {
        let payloads = match events::translate(raw) {
            Ok(payloads) => payloads,
            Err(e @ Error::MalformedField { .. }) => match self.config.on_malformed {
                MalformedPolicy::Skip => {
                    tracing::warn!(code = e.code(), "Skipping event: {}", e);
                    stats.skipped += 1;
                    return Ok(());
                }
                MalformedPolicy::Abort => {
                    tracing::error!(code = e.code(), "Aborting on event: {}", e);
                    return Err(e);
                }
            },
            Err(e) => return Err(e),
        };

        for payload in payloads {
            self.publisher
                .publish(&self.config.topic, payload.as_str())
                .await
                .map_err(|e| {
                    tracing::error!(code = e.code(), "Publish failed: {}", e);
                    e
                })?;
            stats.published += 1;
            tracing::debug!(
                kind = payload.kind(),
                "Published {} to {}",
                payload.as_str(),
                self.config.topic
            );
        }
        Ok(())
    }

    fn transition(&mut self, next: BridgeState) {
        tracing::info!("Bridge state {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}
