//! JSON codec helpers.
//!
//! Gridlink speaks JSON everywhere — socket frames, match payloads, RPC
//! bodies — so instead of a pluggable codec trait there are two free
//! functions that wrap `serde_json` and normalize its errors into
//! [`ProtocolError`]. Having a single decode path matters: it is the one
//! place where "fails closed" is enforced, and every inbound byte slice in
//! the client goes through it.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Serializes a value to JSON bytes.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(value).map_err(ProtocolError::Encode)
}

/// Deserializes a value from JSON bytes.
///
/// Unknown enum tags, missing fields, and type mismatches all come back as
/// [`ProtocolError::Decode`]. Callers drop the frame (inbound) or abort the
/// operation (outbound) — they never guess.
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, ProtocolError> {
    serde_json::from_slice(data).map_err(ProtocolError::Decode)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Probe {
        name: String,
        count: u32,
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let value = Probe {
            name: "hello".into(),
            count: 3,
        };
        let bytes = encode(&value).unwrap();
        let back: Probe = decode(&bytes).unwrap();
        assert_eq!(value, back);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result: Result<Probe, _> = decode(b"not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_missing_field_fails() {
        // Valid JSON, wrong shape. Strict decoding refuses it instead of
        // filling in defaults.
        let result: Result<Probe, _> = decode(br#"{"name": "x"}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_error_display_includes_cause() {
        let err = decode::<Probe>(b"{").unwrap_err();
        assert!(err.to_string().starts_with("decode failed:"));
    }
}
