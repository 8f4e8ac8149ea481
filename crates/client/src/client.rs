use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use octet_http::codec::{MessageDecoder, MessageEncoder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{error, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, RequestFailure};
use crate::pool::ConnectionPool;
use crate::reply::Reply;

/// Sends typed messages over HTTP and decodes typed replies.
///
/// Any `2xx` status is success: a non-empty body is decoded into the reply, an
/// empty one gives [`Reply::Empty`]. Every other status is an
/// [`UnanticipatedResponseStatus`](ClientError::UnanticipatedResponseStatus),
/// unless [`ClientConfig::not_found_as_empty`] turns `404` into an empty reply.
///
/// Each failing call logs exactly one line before returning its error, `WARN` for
/// an unexpected status and `ERROR` for everything else. Successful calls log
/// nothing.
#[derive(Debug, Clone)]
pub struct TypedHttpClient<C> {
    pool: ConnectionPool,
    codec: C,
    config: ClientConfig,
}

impl<C> TypedHttpClient<C>
where
    C: MessageEncoder + MessageDecoder,
{
    pub fn new(pool: ConnectionPool, codec: C, config: ClientConfig) -> Self {
        Self { pool, codec, config }
    }

    /// A client with a pool of its own, built from `config`.
    pub fn with_config(codec: C, config: ClientConfig) -> Self {
        Self::new(ConnectionPool::new(&config), codec, config)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<Reply<T>, ClientError> {
        self.call(Method::GET, url, None).await
    }

    pub async fn get_status(&self, url: &str) -> Result<StatusCode, ClientError> {
        self.call_status(Method::GET, url, None).await
    }

    pub async fn put<M, T>(&self, url: &str, message: &M) -> Result<Reply<T>, ClientError>
    where
        M: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.encode(&Method::PUT, url, message)?;
        self.call(Method::PUT, url, Some(body)).await
    }

    pub async fn put_status<M: Serialize + ?Sized>(&self, url: &str, message: &M) -> Result<StatusCode, ClientError> {
        let body = self.encode(&Method::PUT, url, message)?;
        self.call_status(Method::PUT, url, Some(body)).await
    }

    /// Sends `body` as is, the encoder is not involved.
    pub async fn put_encoded<T: DeserializeOwned>(&self, url: &str, body: Bytes) -> Result<Reply<T>, ClientError> {
        self.call(Method::PUT, url, Some(body)).await
    }

    pub async fn put_encoded_status(&self, url: &str, body: Bytes) -> Result<StatusCode, ClientError> {
        self.call_status(Method::PUT, url, Some(body)).await
    }

    pub async fn post<M, T>(&self, url: &str, message: &M) -> Result<Reply<T>, ClientError>
    where
        M: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = self.encode(&Method::POST, url, message)?;
        self.call(Method::POST, url, Some(body)).await
    }

    pub async fn post_status<M: Serialize + ?Sized>(&self, url: &str, message: &M) -> Result<StatusCode, ClientError> {
        let body = self.encode(&Method::POST, url, message)?;
        self.call_status(Method::POST, url, Some(body)).await
    }

    /// Sends `body` as is, the encoder is not involved.
    pub async fn post_encoded<T: DeserializeOwned>(&self, url: &str, body: Bytes) -> Result<Reply<T>, ClientError> {
        self.call(Method::POST, url, Some(body)).await
    }

    pub async fn post_encoded_status(&self, url: &str, body: Bytes) -> Result<StatusCode, ClientError> {
        self.call_status(Method::POST, url, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, url: &str) -> Result<Reply<T>, ClientError> {
        self.call(Method::DELETE, url, None).await
    }

    pub async fn delete_status(&self, url: &str) -> Result<StatusCode, ClientError> {
        self.call_status(Method::DELETE, url, None).await
    }

    fn encode<M: Serialize + ?Sized>(&self, method: &Method, url: &str, message: &M) -> Result<Bytes, ClientError> {
        self.codec.encode_message(message).map_err(|source| {
            error!(%method, url, cause = %source, "encode request message failed");
            ClientError::Encode { method: method.clone(), url: url.to_owned(), source }
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: Method, url: &str, body: Option<Bytes>) -> Result<Reply<T>, ClientError> {
        let (status, body) = self.exchange(&method, url, body).await?;

        match self.accept(&method, url, status)? {
            Accepted::Success if !body.is_empty() => match self.codec.decode_message(&body) {
                Ok(value) => Ok(Reply::Message { value, status }),
                Err(e) => Err(self.failed(method, url, RequestFailure::from(e))),
            },
            Accepted::Success | Accepted::NotFoundAsEmpty => Ok(Reply::Empty { status }),
        }
    }

    async fn call_status(&self, method: Method, url: &str, body: Option<Bytes>) -> Result<StatusCode, ClientError> {
        let (status, _) = self.exchange(&method, url, body).await?;
        self.accept(&method, url, status)?;
        Ok(status)
    }

    /// Sends the request under the configured timeout.
    ///
    /// The body is read only for a `2xx` status. Any other status is settled by its
    /// headers alone, so the returned body is empty.
    async fn exchange(&self, method: &Method, url: &str, body: Option<Bytes>) -> Result<(StatusCode, Bytes), ClientError> {
        let request = build_request(method, url, body).map_err(|e| self.failed(method.clone(), url, e))?;

        let timeout = self.config.timeout;
        let exchange = async {
            let response = self.pool.send(request).await.map_err(RequestFailure::transport)?;
            let status = response.status();
            if !status.is_success() {
                return Ok::<_, RequestFailure>((status, Bytes::new()));
            }

            let body = response.into_body().collect().await.map_err(RequestFailure::body)?.to_bytes();
            Ok((status, body))
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(cause)) => Err(self.failed(method.clone(), url, cause)),
            Err(_elapsed) => Err(self.failed(method.clone(), url, RequestFailure::timeout(timeout))),
        }
    }

    /// Applies the status policy.
    fn accept(&self, method: &Method, url: &str, status: StatusCode) -> Result<Accepted, ClientError> {
        if status.is_success() {
            return Ok(Accepted::Success);
        }
        if status == StatusCode::NOT_FOUND && self.config.not_found_as_empty {
            return Ok(Accepted::NotFoundAsEmpty);
        }

        warn!(%method, url, status = status.as_u16(), "unanticipated response status");
        Err(ClientError::UnanticipatedResponseStatus { method: method.clone(), url: url.to_owned(), status })
    }

    fn failed(&self, method: Method, url: &str, cause: RequestFailure) -> ClientError {
        error!(%method, url, cause = %cause, "request failed");
        ClientError::RequestFailed { method, url: url.to_owned(), cause }
    }
}

enum Accepted {
    Success,
    NotFoundAsEmpty,
}

fn build_request(method: &Method, url: &str, body: Option<Bytes>) -> Result<Request<Full<Bytes>>, RequestFailure> {
    let mut builder = Request::builder().method(method.clone()).uri(url);
    if body.is_some() {
        builder = builder.header(CONTENT_TYPE, octet_http::octet_stream());
    }

    builder
        .body(Full::new(body.unwrap_or_default()))
        .map_err(|source| RequestFailure::InvalidRequest { source })
}
