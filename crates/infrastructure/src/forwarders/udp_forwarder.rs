use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use knockgate_application::services::{AllowlistService, BlocklistService, SessionStore};
use knockgate_domain::{AccessReason, Service};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const RECEIVE_DEADLINE: Duration = Duration::from_secs(1);
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);
const MAX_SPOOF_ATTEMPTS: u32 = 3;
const MAX_DATAGRAM: usize = 65_507;

struct PseudoSession {
    cancel: CancellationToken,
    to_backend: mpsc::Sender<Vec<u8>>,
    last_seen: chrono::DateTime<Utc>,
    spoof_attempts: u32,
}

/// One bound UDP socket per enabled UDP service (C9). Client flows are
/// pseudo-sessions keyed by `addr:port`, each backed by a task that reads
/// from the backend and verifies the source address on every datagram to
/// guard against reflection/amplification abuse.
pub struct UdpForwarder {
    service: Service,
    blocklist: Arc<BlocklistService>,
    allowlist: Arc<AllowlistService>,
    sessions: Arc<SessionStore>,
    pseudo_sessions: DashMap<SocketAddr, PseudoSession>,
    connection_count: AtomicU32,
    session_timeout: Duration,
    shutdown: CancellationToken,
}

impl UdpForwarder {
    pub fn new(
        service: Service,
        blocklist: Arc<BlocklistService>,
        allowlist: Arc<AllowlistService>,
        sessions: Arc<SessionStore>,
        session_timeout: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            service,
            blocklist,
            allowlist,
            sessions,
            pseudo_sessions: DashMap::new(),
            connection_count: AtomicU32::new(0),
            session_timeout,
            shutdown,
        }
    }

    pub async fn run(self: Arc<Self>) -> std::io::Result<()> {
        let bind_addr: SocketAddr = format!("0.0.0.0:{}", self.service.proxy_listen_port)
            .parse()
            .expect("listen port already validated by ForwarderManager");

        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        #[cfg(unix)]
        socket.set_reuse_port(true)?;
        socket.bind(&bind_addr.into())?;
        socket.set_nonblocking(true)?;

        let std_socket: std::net::UdpSocket = socket.into();
        let client_socket = Arc::new(UdpSocket::from_std(std_socket)?);

        info!(service = %self.service.service_id, port = self.service.proxy_listen_port, "udp forwarder listening");

        let sweep_token = self.shutdown.child_token();
        let sweeper = self.clone();
        tokio::spawn(async move { sweeper.sweep_loop(sweep_token).await });

        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!(service = %self.service.service_id, "udp forwarder shutting down");
                    return Ok(());
                }
                received = tokio::time::timeout(RECEIVE_DEADLINE, client_socket.recv_from(&mut buf)) => {
                    let (len, peer) = match received {
                        Ok(Ok(pair)) => pair,
                        Ok(Err(e)) => {
                            warn!(service = %self.service.service_id, error = %e, "udp recv failed");
                            continue;
                        }
                        Err(_) => continue,
                    };
                    if !self.is_access_allowed(peer.ip()).await {
                        continue;
                    }
                    let datagram = buf[..len].to_vec();
                    self.dispatch(client_socket.clone(), peer, datagram).await;
                }
            }
        }
    }

    async fn is_access_allowed(&self, client_ip: IpAddr) -> bool {
        if !self.blocklist.is_blocked(client_ip).allowed {
            return false;
        }
        match self.allowlist.is_allowed(client_ip).reason {
            AccessReason::Permanent | AccessReason::DnsResolved => true,
            AccessReason::Session => {
                for handle in self.sessions.get_by_ip(client_ip).await {
                    let session = handle.lock().await;
                    if session.is_allowed_service(&self.service.service_id) {
                        return true;
                    }
                }
                false
            }
            _ => false,
        }
    }

    async fn dispatch(
        self: &Arc<Self>,
        client_socket: Arc<UdpSocket>,
        peer: SocketAddr,
        datagram: Vec<u8>,
    ) {
        let to_backend = if let Some(mut entry) = self.pseudo_sessions.get_mut(&peer) {
            entry.last_seen = Utc::now();
            entry.to_backend.clone()
        } else {
            let (tx, rx) = mpsc::channel::<Vec<u8>>(64);
            let cancel = self.shutdown.child_token();
            self.pseudo_sessions.insert(
                peer,
                PseudoSession {
                    cancel: cancel.clone(),
                    to_backend: tx.clone(),
                    last_seen: Utc::now(),
                    spoof_attempts: 0,
                },
            );
            self.connection_count.fetch_add(1, Ordering::AcqRel);
            self.spawn_backend_reader(client_socket, peer, cancel, rx);
            tx
        };

        let _ = to_backend.send(datagram).await;
    }

    fn spawn_backend_reader(
        self: &Arc<Self>,
        client_socket: Arc<UdpSocket>,
        peer: SocketAddr,
        cancel: CancellationToken,
        mut inbound: mpsc::Receiver<Vec<u8>>,
    ) {
        let this = self.clone();
        let backend_host = this.service.backend_host.clone();
        let backend_port = this.service.backend_port;
        let service_id = this.service.service_id.clone();

        tokio::spawn(async move {
            let backend_socket = match UdpSocket::bind("0.0.0.0:0").await {
                Ok(s) => s,
                Err(e) => {
                    warn!(service = %service_id, %peer, error = %e, "failed to open backend socket");
                    return;
                }
            };
            let backend_addr = format!("{backend_host}:{backend_port}");
            if backend_socket.connect(&backend_addr).await.is_err() {
                warn!(service = %service_id, %peer, backend = %backend_addr, "failed to connect backend socket");
                return;
            }

            let mut recv_buf = vec![0u8; MAX_DATAGRAM];
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    Some(payload) = inbound.recv() => {
                        if backend_socket.send(&payload).await.is_err() {
                            break;
                        }
                    }
                    received = backend_socket.recv_from(&mut recv_buf) => {
                        match received {
                            Ok((len, from)) => {
                                if from.ip() != backend_socket.peer_addr().map(|a| a.ip()).unwrap_or(from.ip()) {
                                    let spoofed = this.record_spoof_attempt(peer);
                                    warn!(service = %service_id, %peer, %from, "unexpected source on backend socket");
                                    if spoofed {
                                        break;
                                    }
                                    continue;
                                }
                                if client_socket.send_to(&recv_buf[..len], peer).await.is_err() {
                                    break;
                                }
                            }
                            Err(_) => break,
                        }
                    }
                }
            }
            this.pseudo_sessions.remove(&peer);
            this.connection_count.fetch_sub(1, Ordering::AcqRel);
        });
    }

    /// Returns true once `MAX_SPOOF_ATTEMPTS` has been reached for this
    /// pseudo-session, signalling the caller to terminate it.
    fn record_spoof_attempt(&self, peer: SocketAddr) -> bool {
        if let Some(mut entry) = self.pseudo_sessions.get_mut(&peer) {
            entry.spoof_attempts += 1;
            entry.spoof_attempts >= MAX_SPOOF_ATTEMPTS
        } else {
            false
        }
    }

    async fn sweep_loop(self: Arc<Self>, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = interval.tick() => self.sweep_idle(),
            }
        }
    }

    fn sweep_idle(&self) {
        let now = Utc::now();
        let timeout = chrono::Duration::from_std(self.session_timeout).unwrap_or(chrono::Duration::seconds(60));
        let stale: Vec<SocketAddr> = self
            .pseudo_sessions
            .iter()
            .filter(|e| now - e.value().last_seen >= timeout)
            .map(|e| *e.key())
            .collect();
        for peer in stale {
            if let Some((_, session)) = self.pseudo_sessions.remove(&peer) {
                session.cancel.cancel();
            }
        }
    }

    /// Fires cancellation for every pseudo-session whose client IP matches
    /// `addr`, regardless of port.
    pub fn terminate_by_ip(&self, addr: IpAddr) -> usize {
        let matched: Vec<SocketAddr> = self
            .pseudo_sessions
            .iter()
            .filter(|e| e.key().ip() == addr)
            .map(|e| *e.key())
            .collect();
        for peer in &matched {
            if let Some((_, session)) = self.pseudo_sessions.remove(peer) {
                session.cancel.cancel();
            }
        }
        matched.len()
    }

    /// Client `addr:port` pairs with a live pseudo-session right now.
    pub fn list_connections(&self) -> Vec<SocketAddr> {
        self.pseudo_sessions.iter().map(|e| *e.key()).collect()
    }
}
