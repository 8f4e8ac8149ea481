//! Message codec seam.
//!
//! The transport never looks inside a message. Turning a typed value into bytes
//! and back is the job of an injected pair of capabilities:
//!
//! - [`MessageEncoder`]: `value -> bytes`
//! - [`MessageDecoder`]: `bytes -> value`
//!
//! Both are plain traits so that any wire format can be plugged in. [`JsonCodec`]
//! is provided as a ready-made implementation, mostly useful for tests and demos.

mod json;

pub use json::JsonCodec;

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::error::Error;
use std::sync::Arc;
use thiserror::Error;

/// Converts a typed value into an opaque byte payload.
pub trait MessageEncoder: Send + Sync {
    fn encode_message<T: Serialize + ?Sized>(&self, message: &T) -> Result<Bytes, EncodeError>;
}

/// Converts an opaque byte payload back into a typed value.
///
/// A decoder that cannot produce a value must return an error, there is no
/// "empty" success.
pub trait MessageDecoder: Send + Sync {
    fn decode_message<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, DecodeError>;
}

#[derive(Error, Debug)]
#[error("encode message error: {source}")]
pub struct EncodeError {
    source: Box<dyn Error + Send + Sync>,
}

impl EncodeError {
    pub fn new<E: Into<Box<dyn Error + Send + Sync>>>(source: E) -> Self {
        Self { source: source.into() }
    }

    pub fn into_inner(self) -> Box<dyn Error + Send + Sync> {
        self.source
    }
}

#[derive(Error, Debug)]
#[error("decode message error: {source}")]
pub struct DecodeError {
    source: Box<dyn Error + Send + Sync>,
}

impl DecodeError {
    pub fn new<E: Into<Box<dyn Error + Send + Sync>>>(source: E) -> Self {
        Self { source: source.into() }
    }

    pub fn into_inner(self) -> Box<dyn Error + Send + Sync> {
        self.source
    }
}

impl<C: MessageEncoder + ?Sized> MessageEncoder for &C {
    #[inline]
    fn encode_message<T: Serialize + ?Sized>(&self, message: &T) -> Result<Bytes, EncodeError> {
        (**self).encode_message(message)
    }
}

impl<C: MessageEncoder + ?Sized> MessageEncoder for Arc<C> {
    #[inline]
    fn encode_message<T: Serialize + ?Sized>(&self, message: &T) -> Result<Bytes, EncodeError> {
        (**self).encode_message(message)
    }
}

impl<C: MessageDecoder + ?Sized> MessageDecoder for &C {
    #[inline]
    fn decode_message<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, DecodeError> {
        (**self).decode_message(data)
    }
}

impl<C: MessageDecoder + ?Sized> MessageDecoder for Arc<C> {
    #[inline]
    fn decode_message<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, DecodeError> {
        (**self).decode_message(data)
    }
}
