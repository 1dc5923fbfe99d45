use std::net::{IpAddr, TcpListener as StdTcpListener};
use std::sync::Arc;
use std::time::Duration;

use knockgate_application::ports::FlowRevoker;
use knockgate_application::services::{
    AccessRevocationCoordinator, AllowlistService, BlocklistService, CircuitBreakerRegistry,
    SessionStore,
};
use knockgate_domain::config::{NetworkAccessControlConfig, ProtectedServiceConfig};
use knockgate_domain::{ServiceId, SessionId, Transport, UserId};
use knockgate_infrastructure::forwarders::{BufferPool, ForwarderManager};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Binds an ephemeral port and immediately releases it. Good enough for
/// wiring a forwarder to a free port in a single-threaded test process; a
/// genuinely concurrent test suite would need a retry loop here.
pub fn free_port() -> u16 {
    let listener = StdTcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener.local_addr().unwrap().port()
}

pub fn tcp_service(service_id: &str, listen_port: u16, backend_port: u16) -> ProtectedServiceConfig {
    ProtectedServiceConfig {
        service_id: service_id.to_string(),
        service_name: service_id.to_string(),
        proxy_listen_port_start: listen_port,
        proxy_listen_port_end: None,
        backend_target_host: "127.0.0.1".to_string(),
        backend_target_port: backend_port,
        transport_protocol: Transport::Tcp,
        is_http_protocol: false,
        enabled: true,
        description: None,
        http_config: None,
    }
}

pub fn udp_service(service_id: &str, listen_port: u16, backend_port: u16) -> ProtectedServiceConfig {
    ProtectedServiceConfig {
        service_id: service_id.to_string(),
        service_name: service_id.to_string(),
        proxy_listen_port_start: listen_port,
        proxy_listen_port_end: None,
        backend_target_host: "127.0.0.1".to_string(),
        backend_target_port: backend_port,
        transport_protocol: Transport::Udp,
        is_http_protocol: false,
        enabled: true,
        description: None,
        http_config: None,
    }
}

/// Every collaborator a running gateway wires together, built directly
/// (no YAML, no HTTP layer) so flow tests can drive the blocklist,
/// allowlist, sessions, and forwarders the same way the composition root
/// does without needing a config file on disk.
pub struct Harness {
    pub blocklist: Arc<BlocklistService>,
    pub allowlist: Arc<AllowlistService>,
    pub sessions: Arc<SessionStore>,
    pub circuit_breakers: Arc<CircuitBreakerRegistry>,
    pub forwarders: Arc<ForwarderManager>,
    pub revocation: Arc<AccessRevocationCoordinator>,
}

impl Harness {
    pub fn build(services: &[ProtectedServiceConfig]) -> Self {
        Self::build_with_network(services, &NetworkAccessControlConfig::default())
    }

    pub fn build_with_network(
        services: &[ProtectedServiceConfig],
        network: &NetworkAccessControlConfig,
    ) -> Self {
        let blocklist = Arc::new(BlocklistService::from_config(network));
        let allowlist = Arc::new(AllowlistService::from_config(network));
        let sessions = Arc::new(SessionStore::new(0, Duration::from_secs(3600)));
        let circuit_breakers = Arc::new(CircuitBreakerRegistry::default());
        let buffer_pool = Arc::new(BufferPool::new(4096, 8));

        let forwarders = Arc::new(ForwarderManager::new(
            blocklist.clone(),
            allowlist.clone(),
            sessions.clone(),
            circuit_breakers.clone(),
            buffer_pool,
            0,
            Duration::from_secs(60),
        ));

        let flow_revoker: Arc<dyn FlowRevoker> = forwarders.clone();
        let revocation = Arc::new(AccessRevocationCoordinator::new(
            sessions.clone(),
            allowlist.clone(),
            flow_revoker,
        ));

        forwarders.start_all(services);

        Self {
            blocklist,
            allowlist,
            sessions,
            circuit_breakers,
            forwarders,
            revocation,
        }
    }

    /// Logs in `user` as if the admin API had authenticated them: creates a
    /// session and grants its initial IP in the allowlist, mirroring
    /// `handlers::auth::login`'s two calls in sequence.
    pub fn login(
        &self,
        user_id: UserId,
        username: &str,
        ip: IpAddr,
        allowed_service_ids: Vec<ServiceId>,
    ) -> SessionId {
        let handle = self
            .sessions
            .create(user_id, Arc::from(username), ip, allowed_service_ids, false, true, None)
            .expect("session creation");
        let (session_id, expires_at) = {
            let guard = handle.try_lock().expect("uncontended in test");
            (guard.session_id, guard.expires_at)
        };
        self.allowlist.add_session_ip(session_id, ip, expires_at);
        session_id
    }
}

/// Accepts connections on `port` and echoes back whatever it reads until
/// the client closes its write half.
pub async fn spawn_echo_tcp_backend(port: u16) {
    let listener = TcpListener::bind(("127.0.0.1", port)).await.expect("bind echo backend");
    tokio::spawn(async move {
        loop {
            let (mut stream, _) = match listener.accept().await {
                Ok(pair) => pair,
                Err(_) => continue,
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                loop {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => {
                            if stream.write_all(&buf[..n]).await.is_err() {
                                return;
                            }
                        }
                    }
                }
            });
        }
    });
}

pub fn loopback() -> IpAddr {
    "127.0.0.1".parse().unwrap()
}

pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}
