use std::error::Error;
use std::pin::pin;
use std::sync::Arc;

use bytes::Buf;
use http::StatusCode;
use http_body::Body;
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use tracing::{error, warn};

use crate::buffer::BufferPool;
use crate::codec::MessageDecoder;
use crate::request::BodyDecodeError;

/// Reads and decodes a request body under a hard byte ceiling.
///
/// The ceiling is the capacity of the buffers in the shared [`BufferPool`]. Exactly
/// one buffer is leased per call and it goes back to the pool on every exit.
///
/// With `n` bytes read:
/// - `n == 0` is rejected as too large, same as an oversized body,
/// - `n == capacity` is rejected, there may be a remainder that did not fit,
/// - anything in between is handed to the decoder.
#[derive(Debug, Clone)]
pub struct BoundedBodyDecoder {
    pool: Arc<BufferPool>,
}

impl BoundedBodyDecoder {
    pub fn new(pool: Arc<BufferPool>) -> Self {
        Self { pool }
    }

    /// Creates a decoder with a private pool of `capacity`-sized buffers.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(Arc::new(BufferPool::new(capacity)))
    }

    pub fn pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    pub async fn decode<T, B, D>(&self, body: B, decoder: &D) -> Result<T, BodyDecodeError>
    where
        T: DeserializeOwned,
        B: Body,
        B::Error: Into<Box<dyn Error + Send + Sync>>,
        D: MessageDecoder + ?Sized,
    {
        let mut lease = self.pool.lease();
        let capacity = lease.capacity();

        let count = match read_into(body, &mut lease).await {
            Ok(count) => count,
            Err(e) => {
                warn!(cause = %e, "read request body failed");
                return Err(e);
            }
        };

        if count == 0 || count == capacity {
            warn!(size = count, capacity = capacity, "reject request body, can't prove it fits the buffer");
            return Err(BodyDecodeError::entity_too_large(capacity));
        }

        decoder.decode_message(&lease[..count]).map_err(|e| {
            error!(size = count, cause = %e, "decode request body failed");
            BodyDecodeError::from(e)
        })
    }

    /// Same as [`decode`](Self::decode), shaped as a `(status, value)` pair.
    ///
    /// The value is `None` whenever the status is not `200 OK`.
    pub async fn decode_with_status<T, B, D>(&self, body: B, decoder: &D) -> (StatusCode, Option<T>)
    where
        T: DeserializeOwned,
        B: Body,
        B::Error: Into<Box<dyn Error + Send + Sync>>,
        D: MessageDecoder + ?Sized,
    {
        match self.decode(body, decoder).await {
            Ok(value) => (StatusCode::OK, Some(value)),
            Err(e) => (e.status_code(), None),
        }
    }
}

/// Copies body frames into `buf` until the body ends or `buf` is full.
async fn read_into<B>(body: B, buf: &mut [u8]) -> Result<usize, BodyDecodeError>
where
    B: Body,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
{
    let mut body = pin!(body);
    let mut count = 0;

    while count < buf.len() {
        let Some(frame) = body.frame().await else {
            break;
        };

        // trailers carry no payload
        let Ok(mut data) = frame.map_err(BodyDecodeError::body)?.into_data() else {
            continue;
        };

        while data.has_remaining() && count < buf.len() {
            let chunk = data.chunk();
            let len = chunk.len().min(buf.len() - count);
            buf[count..count + len].copy_from_slice(&chunk[..len]);
            data.advance(len);
            count += len;
        }
    }

    Ok(count)
}
