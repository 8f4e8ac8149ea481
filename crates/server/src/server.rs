use std::convert::Infallible;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener as StdTcpListener};
use std::pin::pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use http::Request;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use octet_http::handler::Handler;
use octet_http::response::build_status_response;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, warn};

use crate::config::ServerConfig;
use crate::dispatch::{ConnectionInfo, InstrumentedDispatcher};
use crate::pipeline::Admission;

pub struct ServerBuilder<H> {
    handler: Option<H>,
    address: Option<SocketAddr>,
    config: ServerConfig,
    admission: Admission,
}

impl<H> ServerBuilder<H> {
    fn new() -> Self {
        Self { handler: None, address: None, config: ServerConfig::default(), admission: Admission::default() }
    }

    pub fn address<A: Into<SocketAddr>>(mut self, address: A) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Listens on `port` on every interface.
    pub fn port(self, port: u16) -> Self {
        self.address((Ipv4Addr::UNSPECIFIED, port))
    }

    pub fn handler(mut self, handler: H) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn admission(mut self, admission: Admission) -> Self {
        self.admission = admission;
        self
    }

    pub fn build(self) -> Result<SelfHostServer<H>, ServerBuildError> {
        let handler = self.handler.ok_or(ServerBuildError::MissingHandler)?;
        let address = self.address.ok_or(ServerBuildError::MissingAddress)?;

        let dispatcher = InstrumentedDispatcher::from_admission(handler, self.admission)
            .slow_request_threshold(self.config.slow_request_threshold);

        Ok(SelfHostServer { dispatcher: Arc::new(dispatcher), address, config: self.config, state: Mutex::new(None) })
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("handler must be set")]
    MissingHandler,
    #[error("address must be set")]
    MissingAddress,
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("bind {address} error: {source}")]
    Bind { address: SocketAddr, source: io::Error },
}

/// An HTTP/1.1 server that can be started and stopped in place.
///
/// Every request goes through an [`InstrumentedDispatcher`]. Both [`start`](Self::start)
/// and [`stop`](Self::stop) can be called any number of times.
pub struct SelfHostServer<H> {
    dispatcher: Arc<InstrumentedDispatcher<H>>,
    address: SocketAddr,
    config: ServerConfig,
    state: Mutex<Option<Running>>,
}

struct Running {
    local_addr: SocketAddr,
    cancel: CancellationToken,
    accept_loop: JoinHandle<()>,
}

impl<H> SelfHostServer<H>
where
    H: Handler<Incoming> + 'static,
{
    pub fn builder() -> ServerBuilder<H> {
        ServerBuilder::new()
    }

    /// Binds the listener and starts accepting connections.
    ///
    /// Returns the bound address, which tells the real port when the configured one
    /// is `0`. Starting a running server only returns its address. Must be called
    /// from within a Tokio runtime.
    pub fn start(&self) -> Result<SocketAddr, ServerError> {
        let mut state = self.state();
        if let Some(running) = state.as_ref() {
            return Ok(running.local_addr);
        }

        let listener = bind(self.address).map_err(|source| {
            error!(address = %self.address, cause = %source, "bind server error");
            ServerError::Bind { address: self.address, source }
        })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind { address: self.address, source })?;

        let cancel = CancellationToken::new();
        let accept_loop = tokio::spawn(accept_loop(listener, Arc::clone(&self.dispatcher), self.config.clone(), cancel.clone()));

        debug!(base_uri = %describe(local_addr), "start listening");
        *state = Some(Running { local_addr, cancel, accept_loop });
        Ok(local_addr)
    }

    /// Stops accepting, lets open connections finish their current exchange and
    /// waits for all of them to close. Requests still running are cancelled.
    pub async fn stop(&self) {
        let Some(running) = self.state().take() else {
            return;
        };

        running.cancel.cancel();
        if let Err(e) = running.accept_loop.await {
            error!(cause = %e, "accept loop ended abnormally");
        }
        debug!(base_uri = %describe(running.local_addr), "stop listening");
    }
}

impl<H> SelfHostServer<H> {
    pub fn is_listening(&self) -> bool {
        self.state().is_some()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.state().as_ref().map(|running| running.local_addr)
    }

    /// The URI clients reach this server on, `localhost` standing in for a wildcard address.
    pub fn base_uri(&self) -> Option<String> {
        self.local_addr().map(describe)
    }

    fn state(&self) -> MutexGuard<'_, Option<Running>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<H> Drop for SelfHostServer<H> {
    fn drop(&mut self) {
        if let Some(running) = self.state().take() {
            running.cancel.cancel();
        }
    }
}

fn bind(address: SocketAddr) -> io::Result<TcpListener> {
    let listener = StdTcpListener::bind(address)?;
    listener.set_nonblocking(true)?;
    TcpListener::from_std(listener)
}

fn describe(addr: SocketAddr) -> String {
    match addr.ip() {
        ip if ip.is_unspecified() => format!("http://localhost:{}", addr.port()),
        IpAddr::V6(ip) => format!("http://[{ip}]:{}", addr.port()),
        IpAddr::V4(ip) => format!("http://{ip}:{}", addr.port()),
    }
}

async fn accept_loop<H>(
    listener: TcpListener,
    dispatcher: Arc<InstrumentedDispatcher<H>>,
    config: ServerConfig,
    cancel: CancellationToken,
) where
    H: Handler<Incoming> + 'static,
{
    let connections = TaskTracker::new();

    loop {
        let (stream, remote) = tokio::select! {
            () = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            },
        };

        connections.spawn(serve_connection(stream, remote, Arc::clone(&dispatcher), config.clone(), cancel.clone()));
    }

    drop(listener);
    connections.close();
    connections.wait().await;
}

async fn serve_connection<H>(
    stream: TcpStream,
    remote: SocketAddr,
    dispatcher: Arc<InstrumentedDispatcher<H>>,
    config: ServerConfig,
    cancel: CancellationToken,
) where
    H: Handler<Incoming> + 'static,
{
    let local = match stream.local_addr() {
        Ok(local) => local,
        Err(e) => {
            warn!(%remote, cause = %e, "connection lost before serving");
            return;
        }
    };
    let info = ConnectionInfo { remote, local };

    let request_cancel = cancel.clone();
    let service = service_fn(move |mut req: Request<Incoming>| {
        let dispatcher = Arc::clone(&dispatcher);
        let cancel = request_cancel.clone();
        async move {
            req.extensions_mut().insert(info);
            let response = match dispatcher.dispatch(req, &cancel).await {
                Ok(response) => response,
                Err(e) => build_status_response(e.status_code()),
            };
            Ok::<_, Infallible>(response)
        }
    });

    let mut builder = http1::Builder::new();
    builder.keep_alive(config.keep_alive).timer(TokioTimer::new()).header_read_timeout(config.header_read_timeout);

    let mut connection = pin!(builder.serve_connection(TokioIo::new(stream), service));
    let result = tokio::select! {
        result = connection.as_mut() => result,
        () = cancel.cancelled() => {
            connection.as_mut().graceful_shutdown();
            connection.await
        }
    };

    match result {
        Ok(()) => debug!(%remote, "finished process, connection shutdown"),
        Err(e) => debug!(%remote, cause = %e, "connection closed with error"),
    }
}
