use std::convert::Infallible;
use std::future::Ready;
use std::net::{Ipv4Addr, SocketAddr};

use http::{Request, Response};
use hyper::body::Incoming;
use octet_http::codec::JsonCodec;
use octet_http::handler::{Handler, make_handler};
use octet_http::request::BoundedBodyDecoder;
use octet_http::response::ResponseBody;
use octet_server::{ConnectionInfo, SelfHostServer, ServerBuildError, TypedEndpoint, typed_handler};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Sends one request with `Connection: close` and returns the raw response.
async fn exchange(addr: SocketAddr, method: &str, body: &str) -> String {
    let mut socket = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "{method} /echo HTTP/1.1\r\nHost: {addr}\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    socket.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    socket.read_to_string(&mut response).await.unwrap();
    response
}

type Greeter = TypedEndpoint<String, JsonCodec, fn(String) -> Ready<Option<String>>>;

fn loopback() -> SocketAddr {
    (Ipv4Addr::LOCALHOST, 0).into()
}

fn greeter() -> impl Handler<Incoming, Error = Infallible> {
    typed_handler(BoundedBodyDecoder::with_capacity(1024), JsonCodec, |name: String| async move {
        Some(format!("hello, {name}"))
    })
}

#[tokio::test]
async fn test_typed_round_trip() {
    let server = SelfHostServer::builder().address(loopback()).handler(greeter()).build().unwrap();
    let addr = server.start().unwrap();

    let response = exchange(addr, "POST", r#""zava""#).await;

    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.contains("content-type: application/octet-stream"), "{response}");
    assert!(response.contains(r#""hello, zava""#), "{response}");

    server.stop().await;
}

#[tokio::test]
async fn test_empty_body_is_rejected() {
    let server = SelfHostServer::builder().address(loopback()).handler(greeter()).build().unwrap();
    let addr = server.start().unwrap();

    let response = exchange(addr, "POST", "").await;
    assert!(response.starts_with("HTTP/1.1 413"), "{response}");

    server.stop().await;
}

#[tokio::test]
async fn test_connection_info_is_attached() {
    let handler = make_handler(|req: Request<Incoming>| async move {
        let info = req.extensions().get::<ConnectionInfo>().copied();
        let body = match info {
            Some(info) if info.remote.ip().is_loopback() => "attached",
            _ => "missing",
        };
        Ok::<_, Infallible>(Response::new(ResponseBody::from(body)))
    });

    let server = SelfHostServer::builder().address(loopback()).handler(handler).build().unwrap();
    let addr = server.start().unwrap();

    let response = exchange(addr, "GET", "").await;
    assert!(response.ends_with("attached"), "{response}");

    server.stop().await;
}

#[tokio::test]
async fn test_start_and_stop_are_idempotent() {
    let server = SelfHostServer::builder().address(loopback()).handler(greeter()).build().unwrap();
    assert!(!server.is_listening());
    assert!(server.base_uri().is_none());

    let first = server.start().unwrap();
    let second = server.start().unwrap();
    assert_eq!(first, second);
    assert!(server.is_listening());
    assert_eq!(server.base_uri(), Some(format!("http://127.0.0.1:{}", first.port())));

    server.stop().await;
    server.stop().await;
    assert!(!server.is_listening());
    assert!(TcpStream::connect(first).await.is_err());

    // a stopped server can be started again
    let restarted = server.start().unwrap();
    assert!(exchange(restarted, "PUT", r#""again""#).await.starts_with("HTTP/1.1 200 OK"));
    server.stop().await;
}

#[tokio::test]
async fn test_wildcard_is_described_as_localhost() {
    let server = SelfHostServer::builder().port(0).handler(greeter()).build().unwrap();
    let addr = server.start().unwrap();

    assert_eq!(server.base_uri(), Some(format!("http://localhost:{}", addr.port())));
    server.stop().await;
}

#[tokio::test]
async fn test_bind_conflict() {
    let first = SelfHostServer::builder().address(loopback()).handler(greeter()).build().unwrap();
    let addr = first.start().unwrap();

    let second = SelfHostServer::builder().address(addr).handler(greeter()).build().unwrap();
    assert!(second.start().is_err());
    assert!(!second.is_listening());

    first.stop().await;
}

#[test]
fn test_builder_requires_handler_and_address() {
    let missing_handler = SelfHostServer::<Greeter>::builder().port(0).build();
    assert!(matches!(missing_handler, Err(ServerBuildError::MissingHandler)));

    let missing_address = SelfHostServer::builder().handler(greeter()).build();
    assert!(matches!(missing_address, Err(ServerBuildError::MissingAddress)));
}
