use std::error::Error;
use std::time::Duration;

use http::{Method, StatusCode};
use octet_http::codec::{DecodeError, EncodeError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The outgoing message could not be encoded, nothing was sent.
    #[error("encode {method} {url} request error: {source}")]
    Encode {
        method: Method,
        url: String,
        #[source]
        source: EncodeError,
    },

    /// The server answered with a status this client does not treat as success.
    #[error("unanticipated response status {status} for {method} {url}")]
    UnanticipatedResponseStatus { method: Method, url: String, status: StatusCode },

    #[error("{method} {url} request failed: {cause}")]
    RequestFailed {
        method: Method,
        url: String,
        #[source]
        cause: RequestFailure,
    },
}

impl ClientError {
    /// The status the server answered with, if it answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::UnanticipatedResponseStatus { status, .. } => Some(*status),
            Self::Encode { .. } | Self::RequestFailed { .. } => None,
        }
    }
}

/// Why a request did not produce a usable response.
#[derive(Error, Debug)]
pub enum RequestFailure {
    #[error("invalid request: {source}")]
    InvalidRequest { source: http::Error },

    #[error("transport error: {source}")]
    Transport { source: Box<dyn Error + Send + Sync> },

    #[error("no complete response within {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("read response body error: {source}")]
    Body { source: hyper::Error },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl RequestFailure {
    pub fn transport<E: Into<Box<dyn Error + Send + Sync>>>(e: E) -> Self {
        Self::Transport { source: e.into() }
    }

    pub fn timeout(timeout: Duration) -> Self {
        Self::Timeout { timeout }
    }

    pub fn body(source: hyper::Error) -> Self {
        Self::Body { source }
    }
}
