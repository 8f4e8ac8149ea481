//! Shared utilities for the client integration tests.

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use octet_http::codec::{DecodeError, EncodeError, JsonCodec, MessageDecoder, MessageEncoder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// A request as the mock backend saw it.
#[derive(Debug, Clone)]
#[allow(dead_code, reason = "not every test looks at every field")]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Starts a backend on an ephemeral loopback port that answers every request with
/// whatever `f` returns. Requests are recorded in arrival order.
pub async fn start_programmable_backend<F, Fut>(f: F) -> (SocketAddr, Arc<Mutex<Vec<Recorded>>>)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, Vec<u8>)> + Send + 'static,
{
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let requests = Arc::clone(&recorded);
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = Arc::clone(&f);
            let requests = Arc::clone(&requests);
            tokio::spawn(async move {
                let Some(request) = read_request(&mut socket).await else {
                    return;
                };
                requests.lock().unwrap().push(request);

                let (status, body) = f().await;
                let head = format!(
                    "HTTP/1.1 {status} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    reason(status),
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, recorded)
}

/// Starts a backend that announces a 100 byte body but sends only 4 bytes of it.
/// Then it closes the connection or, with `stall`, keeps it open and silent.
pub async fn start_truncating_backend(status: u16, stall: bool) -> SocketAddr {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                if read_request(&mut socket).await.is_none() {
                    return;
                }

                let head = format!("HTTP/1.1 {status} {}\r\nContent-Length: 100\r\n\r\nbusy", reason(status));
                let _ = socket.write_all(head.as_bytes()).await;
                if stall {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
            });
        }
    });

    addr
}

async fn read_request(socket: &mut TcpStream) -> Option<Recorded> {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 1024];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split(' ');
    let method = request_line.next()?.to_owned();
    let path = request_line.next()?.to_owned();

    let mut content_length = 0;
    let mut content_type = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else { continue };
        match name.trim().to_ascii_lowercase().as_str() {
            "content-length" => content_length = value.trim().parse().ok()?,
            "content-type" => content_type = Some(value.trim().to_owned()),
            _ => {}
        }
    }

    while buf.len() < head_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    Some(Recorded { method, path, content_type, body: buf[head_end..head_end + content_length].to_vec() })
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Whatever",
    }
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
    listener.local_addr().unwrap()
}

/// [`JsonCodec`] that counts its calls.
#[derive(Debug, Default)]
pub struct CountingCodec {
    pub encoded: AtomicUsize,
    pub decoded: AtomicUsize,
}

impl CountingCodec {
    #[allow(dead_code, reason = "not every test encodes")]
    pub fn encoded(&self) -> usize {
        self.encoded.load(Ordering::SeqCst)
    }

    pub fn decoded(&self) -> usize {
        self.decoded.load(Ordering::SeqCst)
    }
}

impl MessageEncoder for CountingCodec {
    fn encode_message<T: Serialize + ?Sized>(&self, message: &T) -> Result<Bytes, EncodeError> {
        self.encoded.fetch_add(1, Ordering::SeqCst);
        JsonCodec.encode_message(message)
    }
}

impl MessageDecoder for CountingCodec {
    fn decode_message<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, DecodeError> {
        self.decoded.fetch_add(1, Ordering::SeqCst);
        JsonCodec.decode_message(data)
    }
}

/// Levels of every event emitted on this thread while the guard lives.
#[derive(Clone, Default)]
pub struct CapturedLevels(Arc<Mutex<Vec<Level>>>);

impl CapturedLevels {
    pub fn install() -> (Self, DefaultGuard) {
        let levels = Self::default();
        let guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(levels.clone()));
        (levels, guard)
    }

    pub fn take(&self) -> Vec<Level> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

impl<S: Subscriber> Layer<S> for CapturedLevels {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.0.lock().unwrap().push(*event.metadata().level());
    }
}
