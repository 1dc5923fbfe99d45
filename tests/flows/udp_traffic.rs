//! Baseline UDP forwarding: a granted client's datagrams reach the backend
//! and its replies come back through the same pseudo-session. The
//! source-address spoofing guard itself (C9's amplification defense) is
//! unit-tested in `knockgate_infrastructure::forwarders::udp_forwarder`,
//! where the pseudo-session's internal bookkeeping is directly reachable —
//! producing a genuinely mismatched source address from here would require
//! a raw socket this test process has no privilege to open.

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{free_port, loopback, udp_service, Harness};
use tokio::net::UdpSocket;

async fn spawn_echo_udp_backend(port: u16) {
    let socket = UdpSocket::bind(("127.0.0.1", port)).await.expect("bind udp backend");
    tokio::spawn(async move {
        let mut buf = [0u8; 2048];
        loop {
            let (len, peer) = match socket.recv_from(&mut buf).await {
                Ok(pair) => pair,
                Err(_) => continue,
            };
            let _ = socket.send_to(&buf[..len], peer).await;
        }
    });
}

#[tokio::test]
async fn authenticated_client_round_trips_through_a_pseudo_session() {
    let backend_port = free_port();
    spawn_echo_udp_backend(backend_port).await;

    let listen_port = free_port();
    let service = udp_service("svc-udp-echo", listen_port, backend_port);
    let harness = Harness::build(std::slice::from_ref(&service));
    common::settle().await;

    let ip = loopback();
    harness.login(Arc::from("u-bob"), "bob", ip, vec![]);

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client.connect(("127.0.0.1", listen_port)).await.unwrap();
    client.send(b"ping").await.unwrap();

    let mut buf = [0u8; 4];
    let (n, _) = tokio::time::timeout(Duration::from_secs(2), client.recv_from(&mut buf))
        .await
        .expect("reply within deadline")
        .expect("recv_from");
    assert_eq!(&buf[..n], b"ping");

    harness.forwarders.shutdown();
}
