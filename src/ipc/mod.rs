//! Hub socket transport and the bridge loop.
//!
//! The Telldus hub publishes device events on a local Unix stream socket.
//! [`reader`] turns socket reads into notifications, [`bridge`] drives them
//! through translation into a publisher.

pub mod bridge;
pub mod reader;

pub use bridge::{Bridge, BridgeState, BridgeStats};
pub use reader::{connect_socket, EventReader};
