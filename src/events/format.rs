//! Outbound payloads derived from a parameter map.
//!
//! Formatting rules:
//!   protocol == "arctech" → compact `house-unit-group-method`, emitted first
//!   (always)              → generic JSON object of every parameter

use crate::events::parser::ParamMap;
use crate::types::{Error, Result};

/// Protocol tag that enables the compact form.
pub const ARCTECH_PROTOCOL: &str = "arctech";

/// Keys joined, in order, into the compact form.
pub const COMPACT_KEYS: [&str; 4] = ["house", "unit", "group", "method"];

/// One payload ready for the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundPayload {
    /// Dash-joined arctech shorthand.
    Compact(String),
    /// JSON object of the full parameter map, all values strings.
    Generic(String),
}

impl OutboundPayload {
    pub fn as_str(&self) -> &str {
        match self {
            OutboundPayload::Compact(s) | OutboundPayload::Generic(s) => s,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            OutboundPayload::Compact(_) => "compact",
            OutboundPayload::Generic(_) => "generic",
        }
    }
}

/// Derive the payloads for one event, compact form first.
///
/// A missing compact key is logged and only drops the compact form.
pub fn format(params: &ParamMap) -> Result<Vec<OutboundPayload>> {
    let mut payloads = Vec::with_capacity(2);

    match compact(params) {
        Ok(Some(short)) => payloads.push(OutboundPayload::Compact(short)),
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(code = e.code(), "Skipping compact form: {}", e);
        }
    }

    payloads.push(OutboundPayload::Generic(generic(params)?));
    Ok(payloads)
}

/// Compact form for arctech events, `None` for any other protocol.
pub fn compact(params: &ParamMap) -> Result<Option<String>> {
    if params.get("protocol").map(String::as_str) != Some(ARCTECH_PROTOCOL) {
        return Ok(None);
    }

    let mut parts = Vec::with_capacity(COMPACT_KEYS.len());
    for key in COMPACT_KEYS {
        let value = params.get(key).ok_or(Error::MissingField { key })?;
        parts.push(value.as_str());
    }

    Ok(Some(parts.join("-")))
}

/// Generic form: the parameter map as a JSON object.
pub fn generic(params: &ParamMap) -> Result<String> {
    Ok(serde_json::to_string(params)?)
}
