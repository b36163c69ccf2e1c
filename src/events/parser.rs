//! Telldus raw event parsing.
//!
//! The hub writes notifications as semicolon-delimited segments:
//!
//! ```text
//! 16:TDRawDeviceEvent95:class:command;protocol:arctech;house:29145578;...;i1s
//! └──────────── header ─────────────┘ └──────── fields ────────────┘   └rest┘
//! ```
//!
//! Header and remainder are opaque. Each field is a `key:value` pair.

use std::collections::BTreeMap;

use crate::types::{Error, Result};

/// Separator between segments of a notification.
pub const FIELD_SEPARATOR: char = ';';
/// Separator between key and value inside a field.
pub const KEY_VALUE_SEPARATOR: char = ':';

/// Decoded key/value parameters of one notification.
///
/// Keys are unique; a later duplicate overwrites an earlier one.
pub type ParamMap = BTreeMap<String, String>;

/// A notification split into its three parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedEvent {
    pub header: String,
    pub fields: Vec<String>,
    pub remainder: String,
}

impl ParsedEvent {
    /// Decode the fields into a parameter map.
    pub fn params(&self) -> Result<ParamMap> {
        parse_params(&self.fields)
    }
}

/// Split a notification on `;` into header, fields and remainder.
///
/// The header is always present (empty for an empty message). The remainder
/// is the last segment when there are at least two segments.
pub fn split(message: &str) -> ParsedEvent {
    let mut segments: Vec<&str> = message.split(FIELD_SEPARATOR).collect();
    let header = segments.remove(0).to_string();
    let remainder = segments.pop().unwrap_or_default().to_string();
    let fields = segments.into_iter().map(str::to_string).collect();

    ParsedEvent {
        header,
        fields,
        remainder,
    }
}

/// Build a parameter map from `key:value` fields.
///
/// Only the first two `:`-separated tokens are used; anything after the
/// second token is dropped. A field with no `:` is a `MalformedField` error.
pub fn parse_params<S: AsRef<str>>(fields: &[S]) -> Result<ParamMap> {
    let mut params = ParamMap::new();

    for field in fields {
        let field = field.as_ref();
        let mut tokens = field.split(KEY_VALUE_SEPARATOR);
        let key = tokens.next().unwrap_or_default();
        let value = tokens
            .next()
            .ok_or_else(|| Error::malformed_field(field))?;

        params.insert(key.to_string(), value.to_string());
    }

    Ok(params)
}
