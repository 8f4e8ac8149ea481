//! Admission control in front of a [`Handler`].
//!
//! Every request asks an [`AdmissionPolicy`] for a permit before the handler runs.
//! The permit is held for the whole handler call and released when the call ends,
//! whatever the outcome.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use http::{Request, Response, StatusCode};
use octet_http::handler::{BoxError, Handler};
use octet_http::response::{ResponseBody, build_status_response};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{error, warn};

/// Proof that a request was admitted. Dropping it gives the slot back.
pub struct AdmissionPermit {
    guard: Option<Box<dyn Send + Sync>>,
}

impl AdmissionPermit {
    /// A permit that holds nothing back.
    pub fn unlimited() -> Self {
        Self { guard: None }
    }

    /// A permit that releases its slot when `guard` is dropped.
    pub fn new<G: Send + Sync + 'static>(guard: G) -> Self {
        Self { guard: Some(Box::new(guard)) }
    }
}

impl fmt::Debug for AdmissionPermit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionPermit").field("limited", &self.guard.is_some()).finish()
    }
}

/// Decides whether a request may run right now.
///
/// `admit` may wait for capacity. Returning `None` refuses the request, which is
/// answered with `503 Service Unavailable`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdmissionPolicy: Send + Sync {
    async fn admit(&self) -> Option<AdmissionPermit>;
}

/// Bounds the number of handler calls running at once. Extra requests wait.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimit {
    semaphore: Arc<Semaphore>,
    max: usize,
}

impl ConcurrencyLimit {
    /// # Panics
    ///
    /// Panics if `max` is zero.
    pub fn new(max: usize) -> Self {
        assert!(max > 0, "concurrency limit must be positive");
        Self { semaphore: Arc::new(Semaphore::new(max)), max }
    }

    pub fn max(&self) -> usize {
        self.max
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[async_trait]
impl AdmissionPolicy for ConcurrencyLimit {
    async fn admit(&self) -> Option<AdmissionPermit> {
        // acquire only fails once the semaphore is closed, and this one never is
        Arc::clone(&self.semaphore).acquire_owned().await.ok().map(AdmissionPermit::new::<OwnedSemaphorePermit>)
    }
}

/// How a dispatcher limits concurrent handler calls.
#[derive(Clone, Default)]
pub enum Admission {
    /// One slot per available processor.
    #[default]
    AvailableParallelism,
    MaxConcurrent(usize),
    Policy(Arc<dyn AdmissionPolicy>),
}

impl fmt::Debug for Admission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AvailableParallelism => f.write_str("AvailableParallelism"),
            Self::MaxConcurrent(max) => f.debug_tuple("MaxConcurrent").field(max).finish(),
            Self::Policy(_) => f.write_str("Policy(..)"),
        }
    }
}

impl Admission {
    pub(crate) fn into_policy(self) -> Arc<dyn AdmissionPolicy> {
        match self {
            Self::AvailableParallelism => {
                let max = std::thread::available_parallelism().map_or(1, NonZeroUsize::get);
                Arc::new(ConcurrencyLimit::new(max))
            }
            Self::MaxConcurrent(max) => Arc::new(ConcurrencyLimit::new(max)),
            Self::Policy(policy) => policy,
        }
    }
}

/// Runs a handler under an admission policy and turns every outcome into a response.
pub(crate) struct Pipeline<H> {
    handler: H,
    admission: Arc<dyn AdmissionPolicy>,
}

impl<H> Pipeline<H> {
    pub(crate) fn new(handler: H, admission: Admission) -> Self {
        Self { handler, admission: admission.into_policy() }
    }

    pub(crate) async fn process<B>(&self, req: Request<B>) -> Response<ResponseBody>
    where
        H: Handler<B>,
        B: Send + 'static,
    {
        let Some(_permit) = self.admission.admit().await else {
            warn!(method = %req.method(), uri = %req.uri(), "request refused by admission policy");
            return build_status_response(StatusCode::SERVICE_UNAVAILABLE);
        };

        match self.handler.call(req).await {
            Ok(response) => response,
            Err(e) => {
                let e: BoxError = e.into();
                error!(cause = %e, "handler failed, answer with internal server error");
                build_status_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
