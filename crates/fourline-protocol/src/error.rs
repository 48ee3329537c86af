//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding events.
///
/// The inner `serde_json::Error` is wrapped so callers deal with
/// `ProtocolError` uniformly regardless of which codec produced it.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an event into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, an unknown `type` tag,
    /// missing fields, or wrong data types.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
