//! Error types for the ticket protocol.

use thiserror::Error;

/// Errors raised while parsing or building protocol values.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Ticket name or key does not carry a `_YYYY-MM-DD-HH-MM-SS.json` tail.
    #[error("malformed ticket name: {0}")]
    MalformedName(String),

    /// Timestamp string does not follow `YYYY-MM-DD-HH-MM-SS`.
    #[error("malformed ticket timestamp: {0}")]
    MalformedTimestamp(String),

    /// Image URI cannot be classified.
    #[error("invalid image '{image}': {reason}")]
    InvalidImage { image: String, reason: String },

    /// Build context tag is not one of PR, MAINLINE, NIGHTLY, DEV.
    #[error("unknown build context: {0}")]
    UnknownContext(String),

    /// Key has no `-<label>.json` suffix.
    #[error("no state suffix in key: {0}")]
    MissingSuffix(String),

    /// Body could not be written as canonical JSON.
    #[error("canonical encoding failed: {0}")]
    Encoding(String),

    /// Body could not be encoded or decoded.
    #[error("ticket body error: {0}")]
    Body(#[from] serde_json::Error),
}

impl ProtocolError {
    /// Create an INVALID_IMAGE error.
    pub fn invalid_image(image: &str, reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            image: image.to_string(),
            reason: reason.into(),
        }
    }
}
