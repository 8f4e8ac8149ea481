//! Outbound response handling.
//!
//! - [`ResponseBody`]: the `http_body::Body` every handler answers with, either a
//!   ready buffer or a [`BodyProducer`] run on first poll
//! - [`EncodedResponse`]: wraps a model and an encoder into a `200 OK`
//!   `application/octet-stream` response, encoding lazily

mod body;
mod encoded;

pub use body::BodyProducer;
pub use body::ResponseBody;
pub use encoded::EncodedResponse;

use http::{Response, StatusCode};

/// A response with the given status and no body.
pub fn build_status_response(status: StatusCode) -> Response<ResponseBody> {
    let mut response = Response::new(ResponseBody::empty());
    *response.status_mut() = status;
    response
}
