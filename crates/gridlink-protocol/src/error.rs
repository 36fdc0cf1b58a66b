//! Error types for the protocol layer.
//!
//! Every Gridlink crate defines its own error enum, so a `ProtocolError`
//! always means "the bytes were wrong", never "the network failed" or
//! "you are not in a match" — those live in other layers.

/// Errors that can occur while encoding or decoding messages.
///
/// The inbound direction is deliberately strict: anything the decoder does
/// not recognize surfaces here and the frame is dropped by the caller. That
/// is what keeps a misbehaving server from silently corrupting client state.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    ///
    /// Rare in practice — our outbound types always serialize — but the
    /// error path exists so callers never panic on it.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, wrong types,
    /// or an unknown `"type"` tag.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message parsed but violates the protocol contract — for example
    /// a reply of the wrong kind for the request that was sent, or an RPC
    /// result missing its promised fields.
    #[error("malformed message: {0}")]
    Malformed(String),

    /// A match-data frame carried an op code this client does not know.
    #[error("unknown match op code {0}")]
    UnknownOpCode(i64),
}
