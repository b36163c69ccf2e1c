//! Core types for the bridge.
//!
//! This module provides foundational types used throughout the system:
//! - **Errors**: Application error types with thiserror derives
//! - **Config**: Configuration structures for the broker, hub socket, and loop

mod config;
mod errors;

pub use config::{
    BridgeConfig, BrokerConfig, Config, HubConfig, MalformedPolicy, ObservabilityConfig,
};
pub use errors::{Error, Result};
