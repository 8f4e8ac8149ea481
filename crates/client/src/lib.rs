//! Client side of the binary message transport.
//!
//! [`TypedHttpClient`] encodes a message, sends it with `GET`, `PUT`, `POST` or
//! `DELETE` over a shared [`ConnectionPool`], and decodes the reply. The outcome of
//! every call is one of:
//!
//! - [`Reply::Message`]: a `2xx` status with a decoded body
//! - [`Reply::Empty`]: a `2xx` status with no body
//! - a [`ClientError`]
//!
//! # Example
//!
//! ```no_run
//! use octet_client::{ClientConfig, ConnectionPool, TypedHttpClient};
//! use octet_http::codec::JsonCodec;
//!
//! # async fn run() -> Result<(), octet_client::ClientError> {
//! let config = ClientConfig::default();
//! let pool = ConnectionPool::new(&config);
//! let client = TypedHttpClient::new(pool, JsonCodec, config);
//!
//! let (greeting, status) = client.post::<_, String>("http://localhost:8080/greet", "zava").await?.into_value_or_default();
//! println!("{status}: {greeting}");
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod pool;
mod reply;

pub use client::TypedHttpClient;
pub use config::ClientConfig;
pub use error::{ClientError, RequestFailure};
pub use pool::ConnectionPool;
pub use reply::Reply;
