use bytes::Bytes;
use http_body::Body as HttpBody;
use http_body::{Frame, SizeHint};
use std::convert::Infallible;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Produces a response payload once the transport starts pulling the body.
///
/// A producer owns everything it needs, nothing is captured from the request scope.
/// Failures are the producer's business: it logs them and hands back whatever
/// bytes it has, possibly none.
pub trait BodyProducer: Send {
    fn produce(self: Box<Self>) -> Bytes;
}

/// Response body used by every handler in this workspace.
///
/// The error type is [`Infallible`]: by the time a body is polled the status line
/// may already be on the wire, so failures are absorbed and show up as an empty or
/// short body instead.
pub struct ResponseBody {
    inner: Kind,
}

enum Kind {
    Once(Option<Bytes>),
    Deferred(Option<Box<dyn BodyProducer>>),
}

impl ResponseBody {
    pub fn empty() -> Self {
        Self { inner: Kind::Once(None) }
    }

    pub fn once(bytes: Bytes) -> Self {
        if bytes.is_empty() { Self::empty() } else { Self { inner: Kind::Once(Some(bytes)) } }
    }

    /// A body whose bytes are produced on first poll.
    pub fn deferred<P: BodyProducer + 'static>(producer: P) -> Self {
        Self { inner: Kind::Deferred(Some(Box::new(producer))) }
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Kind::Once(bytes) => f.debug_tuple("ResponseBody::Once").field(bytes).finish(),
            Kind::Deferred(producer) => {
                f.debug_struct("ResponseBody::Deferred").field("produced", &producer.is_none()).finish()
            }
        }
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        Self::once(bytes)
    }
}

impl From<String> for ResponseBody {
    fn from(value: String) -> Self {
        Self::once(Bytes::from(value))
    }
}

impl From<&'static str> for ResponseBody {
    fn from(value: &'static str) -> Self {
        Self::once(Bytes::from_static(value.as_bytes()))
    }
}

impl HttpBody for ResponseBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let bytes = match &mut self.get_mut().inner {
            Kind::Once(option_bytes) => option_bytes.take(),
            Kind::Deferred(producer) => producer.take().map(|producer| producer.produce()).filter(|bytes| !bytes.is_empty()),
        };
        Poll::Ready(bytes.map(|bytes| Ok(Frame::data(bytes))))
    }

    fn is_end_stream(&self) -> bool {
        match &self.inner {
            Kind::Once(option_bytes) => option_bytes.is_none(),
            Kind::Deferred(producer) => producer.is_none(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.inner {
            Kind::Once(None) | Kind::Deferred(None) => SizeHint::with_exact(0),
            Kind::Once(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
            Kind::Deferred(Some(_)) => SizeHint::default(),
        }
    }
}
