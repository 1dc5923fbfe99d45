//! A blocked IP that is *also* permanently allowlisted must still be
//! refused: the blocklist check runs first and unconditionally, both at
//! the service level and in the running forwarder.

#[path = "../common/mod.rs"]
mod common;

use common::{free_port, loopback, spawn_echo_tcp_backend, tcp_service, Harness};
use knockgate_domain::config::NetworkAccessControlConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

#[test]
fn blocklist_overrides_permanent_allow_at_the_service_level() {
    let ip = loopback();
    let network = NetworkAccessControlConfig {
        blocked_ip_addresses: vec![ip.to_string()],
        permanently_allowed_ip_ranges: vec![ip.to_string()],
        ..Default::default()
    };
    let harness = Harness::build_with_network(&[], &network);

    assert!(!harness.blocklist.is_blocked(ip).allowed, "blocked IP must report blocked");
    assert!(
        harness.allowlist.is_allowed(ip).allowed,
        "the allowlist entry on its own still grants access"
    );
}

#[tokio::test]
async fn blocked_client_gets_no_reply_despite_permanent_allow() {
    let ip = loopback();
    let backend_port = free_port();
    spawn_echo_tcp_backend(backend_port).await;

    let listen_port = free_port();
    let service = tcp_service("svc-blocked", listen_port, backend_port);
    let network = NetworkAccessControlConfig {
        blocked_ip_addresses: vec![ip.to_string()],
        permanently_allowed_ip_ranges: vec![ip.to_string()],
        ..Default::default()
    };
    let harness = Harness::build_with_network(std::slice::from_ref(&service), &network);
    common::settle().await;

    let mut client = TcpStream::connect(("127.0.0.1", listen_port))
        .await
        .expect("connect to forwarder");
    let _ = client.write_all(b"hello").await;

    let mut buf = [0u8; 5];
    let result = client.read(&mut buf).await;
    assert!(
        matches!(result, Ok(0)) || result.is_err(),
        "a blocked client must never reach the backend, regardless of any allowlist entry"
    );

    harness.forwarders.shutdown();
}
