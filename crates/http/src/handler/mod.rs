//! Request handler abstraction.
//!
//! A [`Handler`] is the per-request entry point a host calls. Handlers are generic
//! over the request body so they can run on top of a real connection body or an
//! in-memory one in tests.

use std::error::Error;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use http::{Request, Response};

use crate::response::ResponseBody;

pub type BoxError = Box<dyn Error + Send + Sync>;

#[async_trait]
pub trait Handler<ReqBody>: Send + Sync {
    type Error: Into<BoxError>;

    async fn call(&self, req: Request<ReqBody>) -> Result<Response<ResponseBody>, Self::Error>;
}

#[async_trait]
impl<ReqBody, H> Handler<ReqBody> for Arc<H>
where
    ReqBody: Send + 'static,
    H: Handler<ReqBody> + ?Sized,
{
    type Error = H::Error;

    async fn call(&self, req: Request<ReqBody>) -> Result<Response<ResponseBody>, Self::Error> {
        (**self).call(req).await
    }
}

#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<ReqBody, Err, F, Fut> Handler<ReqBody> for HandlerFn<F>
where
    ReqBody: Send + 'static,
    F: Fn(Request<ReqBody>) -> Fut + Send + Sync,
    Err: Into<BoxError>,
    Fut: Future<Output = Result<Response<ResponseBody>, Err>> + Send,
{
    type Error = Err;

    async fn call(&self, req: Request<ReqBody>) -> Result<Response<ResponseBody>, Self::Error> {
        (self.f)(req).await
    }
}

pub fn make_handler<F, ReqBody, Err, Ret>(f: F) -> HandlerFn<F>
where
    Err: Into<BoxError>,
    Ret: Future<Output = Result<Response<ResponseBody>, Err>>,
    F: Fn(Request<ReqBody>) -> Ret,
{
    HandlerFn { f }
}
