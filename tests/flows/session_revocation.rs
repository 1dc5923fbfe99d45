//! Terminating a session must close its open connections, remove its
//! allowlist grant, and refuse any new connection attempt from the same
//! client — all within the one `AccessRevocationCoordinator::terminate_session`
//! call, with no further action needed by the caller.

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use common::{free_port, loopback, spawn_echo_tcp_backend, tcp_service, Harness};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[tokio::test]
async fn revocation_closes_the_live_stream_and_blocks_new_ones() {
    let ip = loopback();
    let backend_port = free_port();
    spawn_echo_tcp_backend(backend_port).await;

    let listen_port = free_port();
    let service = tcp_service("svc-revocable", listen_port, backend_port);
    let harness = Harness::build(std::slice::from_ref(&service));
    common::settle().await;

    let session_id = harness.login(Arc::from("u-alice"), "alice", ip, vec![]);

    let mut established = TcpStream::connect(("127.0.0.1", listen_port))
        .await
        .expect("connect to forwarder");
    established.write_all(b"ping").await.unwrap();
    let mut buf = [0u8; 4];
    established.read_exact(&mut buf).await.expect("echoed before revocation");
    assert_eq!(&buf, b"ping");

    harness
        .revocation
        .terminate_session(session_id)
        .await
        .expect("terminate_session");
    common::settle().await;

    assert!(
        !harness.allowlist.is_allowed(ip).allowed,
        "the allowlist grant must be gone immediately after revocation"
    );

    let mut after_buf = [0u8; 4];
    let read_result = established.read(&mut after_buf).await;
    assert!(
        matches!(read_result, Ok(0)) || read_result.is_err(),
        "the already-open stream must be torn down by revocation"
    );

    let mut new_attempt = TcpStream::connect(("127.0.0.1", listen_port))
        .await
        .expect("connect to forwarder");
    let _ = new_attempt.write_all(b"ping").await;
    let mut new_buf = [0u8; 4];
    let new_result = new_attempt.read(&mut new_buf).await;
    assert!(
        matches!(new_result, Ok(0)) || new_result.is_err(),
        "a new connection attempt after revocation must be refused"
    );

    harness.forwarders.shutdown();
}
