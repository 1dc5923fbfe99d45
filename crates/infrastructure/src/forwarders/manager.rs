use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use knockgate_application::ports::FlowRevoker;
use knockgate_application::services::{
    AllowlistService, BlocklistService, CircuitBreakerRegistry, SessionStore,
};
use knockgate_domain::config::ProtectedServiceConfig;
use knockgate_domain::{DomainError, Service, ServiceId, Transport};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::buffer_pool::BufferPool;
use super::tcp_forwarder::TcpForwarder;
use super::udp_forwarder::UdpForwarder;

struct RunningService {
    tcp: Option<Arc<TcpForwarder>>,
    udp: Option<Arc<UdpForwarder>>,
    cancel: CancellationToken,
}

/// One live flow as seen by `GET /api/connections` (C10/C12).
#[derive(Debug, Clone)]
pub struct ConnectionSummary {
    pub service_id: ServiceId,
    pub protocol: &'static str,
    pub client_ip: IpAddr,
    pub client_port: Option<u16>,
}

/// Owns the lifecycle of every `TcpForwarder`/`UdpForwarder` (C10).
/// Validates services on load, opens the right forwarder(s) for
/// `transport = both`, and on hot reload computes the difference by
/// service id + port so unaffected forwarders keep running.
pub struct ForwarderManager {
    blocklist: Arc<BlocklistService>,
    allowlist: Arc<AllowlistService>,
    sessions: Arc<SessionStore>,
    circuit_breakers: Arc<CircuitBreakerRegistry>,
    buffer_pool: Arc<BufferPool>,
    max_connections_per_service: u32,
    udp_session_timeout: Duration,
    root_cancel: CancellationToken,
    running: DashMap<ServiceId, RunningService>,
}

impl ForwarderManager {
    pub fn new(
        blocklist: Arc<BlocklistService>,
        allowlist: Arc<AllowlistService>,
        sessions: Arc<SessionStore>,
        circuit_breakers: Arc<CircuitBreakerRegistry>,
        buffer_pool: Arc<BufferPool>,
        max_connections_per_service: u32,
        udp_session_timeout: Duration,
    ) -> Self {
        Self {
            blocklist,
            allowlist,
            sessions,
            circuit_breakers,
            buffer_pool,
            max_connections_per_service,
            udp_session_timeout,
            root_cancel: CancellationToken::new(),
            running: DashMap::new(),
        }
    }

    pub fn validate(configs: &[ProtectedServiceConfig]) -> Result<(), DomainError> {
        for cfg in configs {
            if cfg.service_id.trim().is_empty() {
                return Err(DomainError::Validation("service_id must not be empty".into()));
            }
            if cfg.proxy_listen_port_start == 0 || cfg.backend_target_port == 0 {
                return Err(DomainError::Validation(format!(
                    "{}: ports must be in 1..=65535",
                    cfg.service_id
                )));
            }
            if cfg.backend_target_host.trim().is_empty() {
                return Err(DomainError::Validation(format!(
                    "{}: backend_target_host must not be empty",
                    cfg.service_id
                )));
            }
        }
        Ok(())
    }

    fn to_domain_service(cfg: &ProtectedServiceConfig, transport: Transport) -> Service {
        Service {
            service_id: cfg.service_id.as_str().into(),
            service_name: cfg.service_name.as_str().into(),
            proxy_listen_port: cfg.proxy_listen_port_start,
            backend_host: cfg.backend_target_host.as_str().into(),
            backend_port: cfg.backend_target_port,
            transport,
            enabled: cfg.enabled,
        }
    }

    fn start_one(&self, cfg: &ProtectedServiceConfig) -> RunningService {
        let cancel = self.root_cancel.child_token();
        let mut tcp = None;
        let mut udp = None;

        if cfg.transport_protocol.includes_tcp() {
            let service = Self::to_domain_service(cfg, cfg.transport_protocol);
            let forwarder = Arc::new(TcpForwarder::new(
                service,
                self.blocklist.clone(),
                self.allowlist.clone(),
                self.sessions.clone(),
                self.circuit_breakers.clone(),
                self.buffer_pool.clone(),
                self.max_connections_per_service,
                cancel.clone(),
            ));
            let spawned = forwarder.clone();
            tokio::spawn(async move {
                if let Err(e) = spawned.run().await {
                    error!(error = %e, "tcp forwarder exited with error");
                }
            });
            tcp = Some(forwarder);
        }

        if cfg.transport_protocol.includes_udp() {
            let service = Self::to_domain_service(cfg, cfg.transport_protocol);
            let forwarder = Arc::new(UdpForwarder::new(
                service,
                self.blocklist.clone(),
                self.allowlist.clone(),
                self.sessions.clone(),
                self.udp_session_timeout,
                cancel.clone(),
            ));
            let spawned = forwarder.clone();
            tokio::spawn(async move {
                if let Err(e) = spawned.run().await {
                    error!(error = %e, "udp forwarder exited with error");
                }
            });
            udp = Some(forwarder);
        }

        RunningService { tcp, udp, cancel }
    }

    pub fn start_all(&self, configs: &[ProtectedServiceConfig]) {
        for cfg in configs.iter().filter(|c| c.enabled) {
            let running = self.start_one(cfg);
            self.running.insert(cfg.service_id.as_str().into(), running);
            info!(service = %cfg.service_id, "forwarder started");
        }
    }

    /// Computes the symmetric difference by service id + port and applies
    /// it: stops removed forwarders, starts new ones, leaves the rest
    /// running. A failed start is logged, not propagated — the reload as a
    /// whole still succeeds.
    pub fn reload(&self, configs: &[ProtectedServiceConfig]) {
        let desired: HashSet<ServiceId> = configs
            .iter()
            .filter(|c| c.enabled)
            .map(|c| ServiceId::from(c.service_id.as_str()))
            .collect();

        let current: HashSet<ServiceId> =
            self.running.iter().map(|e| e.key().clone()).collect();

        for id in current.difference(&desired) {
            if let Some((_, running)) = self.running.remove(id) {
                running.cancel.cancel();
                info!(service = %id, "forwarder stopped on reload");
            }
        }

        for cfg in configs.iter().filter(|c| c.enabled) {
            let id: ServiceId = cfg.service_id.as_str().into();
            if !self.running.contains_key(&id) {
                let running = self.start_one(cfg);
                self.running.insert(id.clone(), running);
                info!(service = %id, "forwarder started on reload");
            }
        }
    }

    pub fn shutdown(&self) {
        self.root_cancel.cancel();
    }

    /// Every live TCP connection and UDP pseudo-session across all running
    /// forwarders, for the admin API's connection listing.
    pub fn list_connections(&self) -> Vec<ConnectionSummary> {
        let mut out = Vec::new();
        for entry in self.running.iter() {
            let service_id = entry.key().clone();
            if let Some(tcp) = &entry.value().tcp {
                for ip in tcp.list_connections() {
                    out.push(ConnectionSummary {
                        service_id: service_id.clone(),
                        protocol: "tcp",
                        client_ip: ip,
                        client_port: None,
                    });
                }
            }
            if let Some(udp) = &entry.value().udp {
                for peer in udp.list_connections() {
                    out.push(ConnectionSummary {
                        service_id: service_id.clone(),
                        protocol: "udp",
                        client_ip: peer.ip(),
                        client_port: Some(peer.port()),
                    });
                }
            }
        }
        out
    }
}

#[async_trait]
impl FlowRevoker for ForwarderManager {
    async fn terminate_tcp_by_ip(&self, addr: IpAddr) -> usize {
        let mut total = 0;
        for entry in self.running.iter() {
            if let Some(tcp) = &entry.value().tcp {
                total += tcp.terminate_by_ip(addr);
            }
        }
        if total == 0 {
            warn!(%addr, "no tcp connections to revoke");
        }
        total
    }

    async fn terminate_udp_by_ip(&self, addr: IpAddr) -> usize {
        let mut total = 0;
        for entry in self.running.iter() {
            if let Some(udp) = &entry.value().udp {
                total += udp.terminate_by_ip(addr);
            }
        }
        total
    }
}
