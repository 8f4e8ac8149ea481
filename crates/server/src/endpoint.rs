use std::convert::Infallible;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use http::{Request, Response};
use http_body::Body;
use octet_http::codec::{MessageDecoder, MessageEncoder};
use octet_http::handler::Handler;
use octet_http::request::BoundedBodyDecoder;
use octet_http::response::{EncodedResponse, ResponseBody, build_status_response};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A [`Handler`] that speaks typed messages on both ends.
///
/// The request body is decoded with a [`BoundedBodyDecoder`], the message goes to
/// `f`, and whatever `f` answers with is sent back as an [`EncodedResponse`]. A body
/// that can not be decoded is answered with the matching status and no body, and
/// `f` is not called.
pub fn typed_handler<Req, Resp, C, F, Fut>(decoder: BoundedBodyDecoder, codec: C, f: F) -> TypedEndpoint<Req, C, F>
where
    C: MessageEncoder + MessageDecoder + Clone + 'static,
    F: Fn(Req) -> Fut + Send + Sync,
    Fut: Future<Output = Option<Resp>> + Send,
    Req: DeserializeOwned + Send,
    Resp: Serialize + Send + 'static,
{
    TypedEndpoint { decoder, codec, f, _request: PhantomData }
}

pub struct TypedEndpoint<Req, C, F> {
    decoder: BoundedBodyDecoder,
    codec: C,
    f: F,
    _request: PhantomData<fn(Req)>,
}

impl<Req, C, F> fmt::Debug for TypedEndpoint<Req, C, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedEndpoint").field("decoder", &self.decoder).finish_non_exhaustive()
    }
}

#[async_trait]
impl<B, Req, Resp, C, F, Fut> Handler<B> for TypedEndpoint<Req, C, F>
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
    C: MessageEncoder + MessageDecoder + Clone + 'static,
    F: Fn(Req) -> Fut + Send + Sync,
    Fut: Future<Output = Option<Resp>> + Send,
    Req: DeserializeOwned + Send,
    Resp: Serialize + Send + 'static,
{
    type Error = Infallible;

    async fn call(&self, req: Request<B>) -> Result<Response<ResponseBody>, Self::Error> {
        let message = match self.decoder.decode::<Req, _, _>(req.into_body(), &self.codec).await {
            Ok(message) => message,
            Err(e) => return Ok(build_status_response(e.status_code())),
        };

        let model = (self.f)(message).await;
        Ok(EncodedResponse::new(model, self.codec.clone()).into_response())
    }
}
