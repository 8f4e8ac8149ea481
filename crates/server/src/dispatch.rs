//! Timing and leveled logging around the request pipeline.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http::header::{CONTENT_TYPE, HOST, USER_AGENT};
use http::{HeaderMap, HeaderName, Request, Response, StatusCode};
use octet_http::handler::Handler;
use octet_http::response::ResponseBody;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Level;

use crate::config::ServerConfig;
use crate::pipeline::{Admission, AdmissionPolicy, Pipeline};

// `tracing::event!` needs the level as a constant
macro_rules! log_request {
    ($level:expr, $summary:ident, $status:ident, $elapsed:ident) => {
        tracing::event!(
            $level,
            method = %$summary.method,
            url = %$summary.url,
            host = $summary.host.as_deref().unwrap_or("-"),
            client = $summary.client.as_deref().unwrap_or("-"),
            content_type = $summary.content_type.as_deref().unwrap_or("-"),
            remote = ?$summary.remote,
            user_agent = $summary.user_agent.as_deref().unwrap_or("-"),
            status = %$status,
            elapsed_secs = $elapsed.as_secs_f64(),
            "process request"
        )
    };
}

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Addresses of the connection a request arrived on.
///
/// The server inserts it in every request's extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub remote: SocketAddr,
    pub local: SocketAddr,
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("request cancelled before completion")]
    Cancelled,
}

impl DispatchError {
    /// The status the host answers with instead of the pipeline's response.
    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Wraps the request pipeline with a stopwatch and one log line per request.
///
/// The line goes out at `WARN` when the request took longer than the slow request
/// threshold and at `DEBUG` otherwise. Status, headers and body are handed back
/// exactly as the pipeline produced them.
pub struct InstrumentedDispatcher<H> {
    pipeline: Pipeline<H>,
    slow_threshold: Duration,
}

impl<H> InstrumentedDispatcher<H> {
    /// Limits concurrent handler calls to the available hardware parallelism.
    pub fn new(handler: H) -> Self {
        Self::from_admission(handler, Admission::AvailableParallelism)
    }

    pub fn with_max_concurrency(handler: H, max: usize) -> Self {
        Self::from_admission(handler, Admission::MaxConcurrent(max))
    }

    pub fn with_admission(handler: H, policy: Arc<dyn AdmissionPolicy>) -> Self {
        Self::from_admission(handler, Admission::Policy(policy))
    }

    pub fn from_admission(handler: H, admission: Admission) -> Self {
        Self { pipeline: Pipeline::new(handler, admission), slow_threshold: ServerConfig::default().slow_request_threshold }
    }

    #[must_use]
    pub fn slow_request_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    /// Runs `req` through the pipeline, or gives up as soon as `cancel` fires.
    ///
    /// A cancelled request drops the in-flight handler future, still logs its line
    /// with the status of [`DispatchError::status_code`] and returns
    /// [`DispatchError::Cancelled`].
    pub async fn dispatch<B>(&self, req: Request<B>, cancel: &CancellationToken) -> Result<Response<ResponseBody>, DispatchError>
    where
        H: Handler<B>,
        B: Send + 'static,
    {
        let summary = RequestSummary::capture(&req);
        let start = Instant::now();

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(DispatchError::Cancelled),
            response = self.pipeline.process(req) => Ok(response),
        };

        let elapsed = start.elapsed();
        let status = match &result {
            Ok(response) => response.status().as_u16(),
            Err(e) => e.status_code().as_u16(),
        };

        if elapsed > self.slow_threshold {
            log_request!(Level::WARN, summary, status, elapsed);
        } else {
            log_request!(Level::DEBUG, summary, status, elapsed);
        }

        result
    }
}

/// What gets logged about a request, taken before the request moves into the pipeline.
struct RequestSummary {
    method: http::Method,
    url: http::Uri,
    host: Option<String>,
    client: Option<String>,
    content_type: Option<String>,
    remote: Option<SocketAddr>,
    user_agent: Option<String>,
}

impl RequestSummary {
    fn capture<B>(req: &Request<B>) -> Self {
        let headers = req.headers();
        let remote = req.extensions().get::<ConnectionInfo>().map(|info| info.remote);

        // first hop of a forwarded chain, else whoever is connected
        let client = header_str(headers, &X_FORWARDED_FOR)
            .and_then(|chain| chain.split(',').next())
            .map(|ip| ip.trim().to_owned())
            .or_else(|| remote.map(|addr| addr.ip().to_string()));

        Self {
            method: req.method().clone(),
            url: req.uri().clone(),
            host: header_str(headers, &HOST).map(str::to_owned),
            client,
            content_type: header_str(headers, &CONTENT_TYPE).map(str::to_owned),
            remote,
            user_agent: header_str(headers, &USER_AGENT).map(str::to_owned),
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
