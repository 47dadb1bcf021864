//! Codec trait and implementations for serializing structured values.
//!
//! The durable store keeps a few columns as opaque blobs (the ordered
//! player list, mode-specific state). It doesn't care HOW those values are
//! serialized; it just needs something that implements [`Codec`].
//!
//! Currently we provide [`JsonCodec`] (human-readable, easy to inspect
//! with any SQLite browser).

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust values to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because the store moves its codec into
/// blocking tasks that may run on any thread of the runtime.
///
/// `DeserializeOwned` (vs plain `Deserialize`) means the result doesn't
/// borrow from the input bytes, so the row buffer can be dropped right
/// after decoding.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use wordforge_protocol::{Codec, JsonCodec, ModeRecord, PlayerId};
///
/// let codec = JsonCodec;
/// let record = ModeRecord {
///     last_guesser: Some(PlayerId(7)),
///     ..ModeRecord::default()
/// };
///
/// let bytes = codec.encode(&record).unwrap();
/// let decoded: ModeRecord = codec.decode(&bytes).unwrap();
/// assert_eq!(record, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
