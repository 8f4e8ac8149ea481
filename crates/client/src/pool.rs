use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::{Client, Error};
use hyper_util::rt::{TokioExecutor, TokioTimer};

use crate::config::ClientConfig;

/// The long-lived connection resource shared by every client built on it.
///
/// Connections are kept alive and reused across calls. Cloning is cheap and the
/// clones share the same connections.
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl ConnectionPool {
    pub fn new(config: &ClientConfig) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_timer(TokioTimer::new())
            .build_http();
        Self { client }
    }

    pub(crate) async fn send(&self, request: Request<Full<Bytes>>) -> Result<Response<Incoming>, Error> {
        self.client.request(request).await
    }
}

impl Default for ConnectionPool {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}
