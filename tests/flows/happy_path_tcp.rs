//! One TCP service, one unrestricted user: login grants the client's IP,
//! and a TCP connection through the forwarder reaches the real backend.

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use common::{free_port, loopback, spawn_echo_tcp_backend, tcp_service, Harness};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[tokio::test]
async fn authenticated_client_reaches_backend() {
    let backend_port = free_port();
    spawn_echo_tcp_backend(backend_port).await;

    let listen_port = free_port();
    let service = tcp_service("svc-echo", listen_port, backend_port);
    let harness = Harness::build(std::slice::from_ref(&service));
    common::settle().await;

    let ip = loopback();
    harness.login(Arc::from("u-alice"), "alice", ip, vec![]);

    let mut client = TcpStream::connect(("127.0.0.1", listen_port))
        .await
        .expect("connect to forwarder");
    client.write_all(b"hello").await.unwrap();

    let mut buf = [0u8; 5];
    client.read_exact(&mut buf).await.expect("echoed reply");
    assert_eq!(&buf, b"hello");

    harness.forwarders.shutdown();
}

#[tokio::test]
async fn unauthenticated_client_gets_no_reply() {
    let backend_port = free_port();
    spawn_echo_tcp_backend(backend_port).await;

    let listen_port = free_port();
    let service = tcp_service("svc-echo-2", listen_port, backend_port);
    let harness = Harness::build(std::slice::from_ref(&service));
    common::settle().await;

    let mut client = TcpStream::connect(("127.0.0.1", listen_port))
        .await
        .expect("connect to forwarder");
    let _ = client.write_all(b"hello").await;

    let mut buf = [0u8; 5];
    let result = client.read(&mut buf).await;
    assert!(
        matches!(result, Ok(0)) || result.is_err(),
        "unauthenticated client must never see an echoed reply"
    );

    harness.forwarders.shutdown();
}
