use crate::codec::DecodeError;
use http::StatusCode;
use std::error::Error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BodyDecodeError {
    /// The body was empty, or filled the whole buffer so a remainder can not be ruled out.
    #[error("request entity too large, buffer capacity is {capacity} bytes")]
    EntityTooLarge { capacity: usize },

    #[error("read request body error: {source}")]
    Body { source: Box<dyn Error + Send + Sync> },

    #[error("decode request body error: {source}")]
    Decode {
        #[from]
        source: DecodeError,
    },
}

impl BodyDecodeError {
    pub fn entity_too_large(capacity: usize) -> Self {
        Self::EntityTooLarge { capacity }
    }

    pub fn body<E: Into<Box<dyn Error + Send + Sync>>>(e: E) -> Self {
        Self::Body { source: e.into() }
    }

    /// The status code a server should answer with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::EntityTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Body { .. } => StatusCode::BAD_REQUEST,
            Self::Decode { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
