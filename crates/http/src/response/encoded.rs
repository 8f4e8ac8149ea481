use std::io;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Response, StatusCode};
use serde::Serialize;
use tracing::error;

use crate::codec::MessageEncoder;
use crate::response::{BodyProducer, ResponseBody};

/// A `200 OK` response carrying an encoded model as `application/octet-stream`.
///
/// Encoding does not happen here. [`into_response`](Self::into_response) attaches a
/// deferred body that encodes when the transport first pulls it, and
/// [`write_to`](Self::write_to) encodes straight into a caller-owned writer.
/// A missing model gives an empty body and the encoder is never called.
#[derive(Debug)]
pub struct EncodedResponse<T, E> {
    model: Option<T>,
    encoder: E,
}

impl<T, E> EncodedResponse<T, E>
where
    T: Serialize + Send + 'static,
    E: MessageEncoder + 'static,
{
    pub fn new(model: Option<T>, encoder: E) -> Self {
        Self { model, encoder }
    }

    pub fn into_response(self) -> Response<ResponseBody> {
        let body = match self.model {
            Some(model) => ResponseBody::deferred(EncodeContents { model, encoder: self.encoder }),
            None => ResponseBody::empty(),
        };

        let mut response = Response::new(body);
        *response.status_mut() = StatusCode::OK;
        response.headers_mut().insert(CONTENT_TYPE, crate::octet_stream());
        response
    }

    /// Encodes the model and writes it to `out`.
    ///
    /// `out` is only borrowed, it is neither flushed nor closed here: the stream
    /// belongs to whoever handed it in. Errors are logged and swallowed, which can
    /// leave `out` with a partial payload.
    pub fn write_to<W: io::Write + ?Sized>(self, out: &mut W) {
        let Some(model) = self.model else {
            return;
        };

        let bytes = EncodeContents { model, encoder: self.encoder }.encode();
        if let Err(e) = out.write_all(&bytes) {
            error!(size = bytes.len(), cause = %e, "write encoded response failed");
        }
    }
}

struct EncodeContents<T, E> {
    model: T,
    encoder: E,
}

impl<T: Serialize, E: MessageEncoder> EncodeContents<T, E> {
    fn encode(&self) -> Bytes {
        match self.encoder.encode_message(&self.model) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(cause = %e, "encode response model failed");
                Bytes::new()
            }
        }
    }
}

impl<T, E> BodyProducer for EncodeContents<T, E>
where
    T: Serialize + Send,
    E: MessageEncoder,
{
    fn produce(self: Box<Self>) -> Bytes {
        self.encode()
    }
}
