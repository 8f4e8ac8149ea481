//! Server side of the binary message transport.
//!
//! - [`SelfHostServer`]: binds a socket and serves HTTP/1.1 with `hyper`, start and
//!   stop in place
//! - [`InstrumentedDispatcher`]: times every request and logs one line for it, `WARN`
//!   when slow and `DEBUG` otherwise
//! - [`pipeline`]: admission control in front of the handler, refused requests get
//!   `503 Service Unavailable`
//! - [`typed_handler`]: glue from a `async fn(Req) -> Option<Resp>` to a [`Handler`](octet_http::handler::Handler)
//!
//! # Example
//!
//! ```no_run
//! use octet_http::codec::JsonCodec;
//! use octet_http::request::BoundedBodyDecoder;
//! use octet_server::{SelfHostServer, typed_handler};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = typed_handler(BoundedBodyDecoder::with_capacity(64 * 1024), JsonCodec, |name: String| async move {
//!     Some(format!("hello, {name}"))
//! });
//!
//! let server = SelfHostServer::builder().port(8080).handler(handler).build()?;
//! server.start()?;
//! println!("serving on {:?}", server.base_uri());
//!
//! tokio::signal::ctrl_c().await?;
//! server.stop().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod dispatch;
mod endpoint;
pub mod pipeline;
mod server;

pub use config::ServerConfig;
pub use dispatch::{ConnectionInfo, DispatchError, InstrumentedDispatcher};
pub use endpoint::{TypedEndpoint, typed_handler};
pub use server::{SelfHostServer, ServerBuildError, ServerBuilder, ServerError};
