//! Inbound request body handling.
//!
//! [`BoundedBodyDecoder`] reads a request body into a single pooled buffer and
//! decodes it with the injected [`MessageDecoder`](crate::codec::MessageDecoder).
//! A body that can not be proven to fit inside one buffer is rejected, it is never
//! truncated and never partially decoded.

mod body_decoder;
mod error;

pub use body_decoder::BoundedBodyDecoder;
pub use error::BodyDecodeError;
