//! Codec trait and implementations for serializing/deserializing events.
//!
//! The handler never calls `serde_json` directly; it goes through a
//! [`Codec`] so the wire format can change without touching routing code.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values to bytes and decodes them back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Browser trivia clients speak JSON natively, so this is the only codec
/// the server ships with.
///
/// ```rust
/// use quizforge_protocol::{ClientEvent, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let event: ClientEvent = codec
///     .decode(br#"{"type":"start","roomId":"R1"}"#)
///     .unwrap();
/// assert!(matches!(event, ClientEvent::Start { .. }));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ServerEvent, Standing};

    #[test]
    fn test_json_codec_encodes_server_event() {
        let bytes = JsonCodec
            .encode(&ServerEvent::LobbyUpdate {
                players: vec![Standing {
                    username: "ada".into(),
                    score: 0,
                }],
            })
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["type"], "lobbyUpdate");
        assert_eq!(json["players"][0]["username"], "ada");
    }

    #[test]
    fn test_json_codec_decode_garbage_is_decode_error() {
        let result: Result<ServerEvent, _> = JsonCodec.decode(b"not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
