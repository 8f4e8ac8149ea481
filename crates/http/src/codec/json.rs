use crate::codec::{DecodeError, EncodeError, MessageDecoder, MessageEncoder};
use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A [`MessageEncoder`] and [`MessageDecoder`] backed by `serde_json`.
///
/// The payload is still shipped as `application/octet-stream`, the transport does
/// not care which format sits inside.
#[derive(Debug, Default, Copy, Clone)]
pub struct JsonCodec;

impl MessageEncoder for JsonCodec {
    fn encode_message<T: Serialize + ?Sized>(&self, message: &T) -> Result<Bytes, EncodeError> {
        serde_json::to_vec(message).map(Bytes::from).map_err(EncodeError::new)
    }
}

impl MessageDecoder for JsonCodec {
    fn decode_message<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, DecodeError> {
        serde_json::from_slice(data).map_err(DecodeError::new)
    }
}
