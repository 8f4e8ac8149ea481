//! Binary message transport primitives for HTTP.
//!
//! This crate holds the transport-neutral core shared by the `octet-server` and
//! `octet-client` crates: typed messages travel as opaque `application/octet-stream`
//! payloads, and this crate makes sure that reading and writing those payloads
//! stays bounded and never takes the serving task down.
//!
//! # Architecture
//!
//! - [`codec`]: the injected [`MessageEncoder`](codec::MessageEncoder) /
//!   [`MessageDecoder`](codec::MessageDecoder) seam
//! - [`buffer`]: [`BufferPool`](buffer::BufferPool), fixed-capacity buffers for body reads
//! - [`request`]: [`BoundedBodyDecoder`](request::BoundedBodyDecoder), decodes a request
//!   body that fits in one pooled buffer and rejects everything else
//! - [`response`]: [`ResponseBody`](response::ResponseBody) and
//!   [`EncodedResponse`](response::EncodedResponse), encoding deferred until the
//!   transport pulls the body
//! - [`handler`]: the [`Handler`](handler::Handler) trait hosts dispatch to
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use http::{Request, Response};
//! use http_body_util::Full;
//! use octet_http::codec::JsonCodec;
//! use octet_http::handler::make_handler;
//! use octet_http::request::BoundedBodyDecoder;
//! use octet_http::response::{EncodedResponse, ResponseBody};
//! use std::convert::Infallible;
//!
//! # async fn run() {
//! let decoder = BoundedBodyDecoder::with_capacity(64 * 1024);
//!
//! let handler = make_handler(move |request: Request<Full<Bytes>>| {
//!     let decoder = decoder.clone();
//!     async move {
//!         let response = match decoder.decode::<Vec<u64>, _, _>(request.into_body(), &JsonCodec).await {
//!             Ok(numbers) => EncodedResponse::new(Some(numbers.iter().sum::<u64>()), JsonCodec).into_response(),
//!             Err(e) => {
//!                 let mut response = Response::new(ResponseBody::empty());
//!                 *response.status_mut() = e.status_code();
//!                 response
//!             }
//!         };
//!         Ok::<_, Infallible>(response)
//!     }
//! });
//! # let _ = handler;
//! # }
//! ```
//!
//! # Error Handling
//!
//! - [`codec::EncodeError`] / [`codec::DecodeError`]: failures reported by the codec
//! - [`request::BodyDecodeError`]: why a request body was refused, with the status to
//!   answer with
//!
//! Writing a response never fails from the caller's point of view: encode and write
//! errors are logged and the body comes out empty or short.

pub mod buffer;
pub mod codec;
pub mod config;
pub mod handler;
pub mod request;
pub mod response;

use http::HeaderValue;

/// Content type of every payload this workspace sends.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// [`OCTET_STREAM`] as a header value.
#[inline]
pub fn octet_stream() -> HeaderValue {
    HeaderValue::from_static(OCTET_STREAM)
}
