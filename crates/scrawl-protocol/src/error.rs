//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A value could not be serialized.
    #[cfg(feature = "json")]
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),

    /// Incoming bytes were malformed or did not match the expected shape.
    #[cfg(feature = "json")]
    #[error("failed to decode message: {0}")]
    Decode(#[source] serde_json::Error),
}
