//! Event translation — Telldus hub notifications → broker payloads.
//!
//! Pure, stateless functions. The bridge loop feeds each raw notification
//! through [`parser::split`], [`parser::parse_params`] and [`format::format`].

pub mod format;
pub mod parser;

pub use format::{format, OutboundPayload};
pub use parser::{parse_params, split, ParamMap, ParsedEvent};

use crate::types::Result;

/// Translate one notification into its outbound payloads.
pub fn translate(message: &str) -> Result<Vec<OutboundPayload>> {
    let params = split(message).params()?;
    format(&params)
}
