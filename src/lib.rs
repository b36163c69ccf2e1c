//! # Telldus Bridge - hub events to MQTT
//!
//! Reads raw device-event notifications from the Telldus hub's local event
//! socket and republishes them to an MQTT broker:
//! - Parsing of the hub's `;`/`:` delimited notification format
//! - Compact `house-unit-group-method` payloads for arctech devices
//! - Generic JSON payloads for every event
//! - A sequential read → translate → publish loop
//!
//! ## Architecture
//!
//! ```text
//!   /tmp/TelldusEvents        ┌──────────────────────────────┐
//!   ──── raw event ────────►  │  Bridge loop                 │
//!                             │  ┌────────┐   ┌───────────┐  │
//!                             │  │ parser │──►│ formatter │  │
//!                             │  └────────┘   └─────┬─────┘  │
//!                             └─────────────────────┼────────┘
//!                                                   ▼
//!                                    Publisher ──► MQTT telldus/event
//! ```

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod events;
pub mod ipc;
pub mod publish;
pub mod types;

pub mod observability;

pub use types::{Config, Error, Result};
