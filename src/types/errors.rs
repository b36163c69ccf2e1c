//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for the bridge.
#[derive(Error, Debug)]
pub enum Error {
    /// Event socket or broker unreachable at startup. Fatal.
    #[error("connection error: {0}")]
    Connection(String),

    /// A parameter field carried no `key:value` separator.
    #[error("malformed field: {field:?} has no ':' separator")]
    MalformedField { field: String },

    /// An arctech event lacked one of the keys the compact form needs.
    #[error("missing field: {key}")]
    MissingField { key: &'static str },

    /// The broker client refused or lost a message.
    #[error("publish error: {0}")]
    Publish(String),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable code for structured log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Connection(_) => "CONNECTION",
            Error::MalformedField { .. } => "MALFORMED_FIELD",
            Error::MissingField { .. } => "MISSING_FIELD",
            Error::Publish(_) => "PUBLISH",
            Error::Config(_) => "CONFIG",
            Error::Serialization(_) => "SERIALIZATION",
            Error::Io(_) => "IO",
        }
    }

    /// Errors that must end the process rather than a single message.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::Config(_))
    }
}

// Convenience constructors
impl Error {
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    pub fn malformed_field(field: impl Into<String>) -> Self {
        Self::MalformedField {
            field: field.into(),
        }
    }

    pub fn publish(msg: impl Into<String>) -> Self {
        Self::Publish(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
