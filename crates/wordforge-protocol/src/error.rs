//! Error types for the protocol layer.

/// Errors that can occur while encoding, decoding, or parsing shared types.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust value).
    ///
    /// Common causes: a column written by an older schema, truncated
    /// data, or a hand-edited row.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A value parsed fine but is not meaningful, e.g. an unknown game
    /// mode name read back from storage.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}
