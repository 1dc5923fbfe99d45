use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use knockgate_application::services::{
    AllowlistService, BlocklistService, CircuitBreakerRegistry, SessionStore,
};
use knockgate_domain::{AccessReason, Service, ServiceId};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::io::{self, AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use super::buffer_pool::BufferPool;

const DIAL_TIMEOUT: Duration = Duration::from_secs(10);

struct TrackedConnection {
    addr: IpAddr,
    cancel: CancellationToken,
}

/// One listener per enabled TCP service (C8). Gates, tracks, and splices
/// every accepted connection; supports instant revocation by client IP.
pub struct TcpForwarder {
    service: Service,
    blocklist: Arc<BlocklistService>,
    allowlist: Arc<AllowlistService>,
    sessions: Arc<SessionStore>,
    circuit_breakers: Arc<CircuitBreakerRegistry>,
    buffer_pool: Arc<BufferPool>,
    connections: DashMap<Uuid, TrackedConnection>,
    connection_count: AtomicU32,
    max_connections: u32,
    shutdown: CancellationToken,
}

impl TcpForwarder {
    pub fn new(
        service: Service,
        blocklist: Arc<BlocklistService>,
        allowlist: Arc<AllowlistService>,
        sessions: Arc<SessionStore>,
        circuit_breakers: Arc<CircuitBreakerRegistry>,
        buffer_pool: Arc<BufferPool>,
        max_connections: u32,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            service,
            blocklist,
            allowlist,
            sessions,
            circuit_breakers,
            buffer_pool,
            connections: DashMap::new(),
            connection_count: AtomicU32::new(0),
            max_connections,
            shutdown,
        }
    }

    pub async fn run(self: Arc<Self>) -> io::Result<()> {
        let bind_addr: SocketAddr = format!("0.0.0.0:{}", self.service.proxy_listen_port)
            .parse()
            .expect("listen port already validated by ForwarderManager");

        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        #[cfg(unix)]
        socket.set_reuse_port(true)?;
        socket.bind(&bind_addr.into())?;
        socket.listen(1024)?;
        socket.set_nonblocking(true)?;

        let std_listener: std::net::TcpListener = socket.into();
        let listener = TcpListener::from_std(std_listener)?;

        info!(service = %self.service.service_id, port = self.service.proxy_listen_port, "tcp forwarder listening");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!(service = %self.service.service_id, "tcp forwarder shutting down");
                    return Ok(());
                }
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!(service = %self.service.service_id, error = %e, "accept failed");
                            continue;
                        }
                    };
                    let this = self.clone();
                    tokio::spawn(async move { this.handle_connection(stream, peer).await });
                }
            }
        }
    }

    async fn handle_connection(self: Arc<Self>, client: TcpStream, peer: SocketAddr) {
        let client_ip = peer.ip();

        if !self.blocklist.is_blocked(client_ip).allowed {
            return;
        }

        if !self.is_access_allowed(client_ip).await {
            return;
        }

        if self.max_connections > 0
            && self.connection_count.load(Ordering::Acquire) >= self.max_connections
        {
            warn!(service = %self.service.service_id, %client_ip, "connection ceiling reached, rejecting");
            return;
        }

        // Registered before the circuit-breaker check and the backend dial
        // so a connection in flight for up to DIAL_TIMEOUT is already
        // visible to `terminate_by_ip` and counted against the ceiling.
        let conn_id = Uuid::new_v4();
        let cancel = self.shutdown.child_token();
        self.connections.insert(
            conn_id,
            TrackedConnection {
                addr: client_ip,
                cancel: cancel.clone(),
            },
        );
        self.connection_count.fetch_add(1, Ordering::AcqRel);

        if !self.circuit_breakers.allow(&self.service.service_id) {
            warn!(service = %self.service.service_id, %client_ip, "circuit open, rejecting connection");
            self.deregister(&conn_id);
            return;
        }

        let backend_addr = format!("{}:{}", self.service.backend_host, self.service.backend_port);
        let backend = tokio::select! {
            _ = cancel.cancelled() => {
                self.deregister(&conn_id);
                return;
            }
            dialed = timeout(DIAL_TIMEOUT, TcpStream::connect(&backend_addr)) => {
                match dialed {
                    Ok(Ok(stream)) => {
                        self.circuit_breakers.record_success(&self.service.service_id);
                        stream
                    }
                    Ok(Err(e)) => {
                        self.circuit_breakers.record_failure(&self.service.service_id);
                        warn!(service = %self.service.service_id, %client_ip, error = %e, "backend dial failed");
                        self.deregister(&conn_id);
                        return;
                    }
                    Err(_) => {
                        self.circuit_breakers.record_failure(&self.service.service_id);
                        warn!(service = %self.service.service_id, %client_ip, "backend dial timed out");
                        self.deregister(&conn_id);
                        return;
                    }
                }
            }
        };

        self.splice(client, backend, cancel).await;

        self.deregister(&conn_id);
    }

    fn deregister(&self, conn_id: &Uuid) {
        self.connections.remove(conn_id);
        self.connection_count.fetch_sub(1, Ordering::AcqRel);
    }

    /// Mirrors C4's `is_allowed_for_service`: a permanent or DNS-resolved
    /// grant authorizes every service; a session grant additionally
    /// requires the session's `allowed_service_ids` to cover this service.
    async fn is_access_allowed(&self, client_ip: IpAddr) -> bool {
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

    async fn splice(&self, client: TcpStream, backend: TcpStream, cancel: CancellationToken) {
        let (mut client_rd, mut client_wr) = client.into_split();
        let (mut backend_rd, mut backend_wr) = backend.into_split();

        let pool_a = self.buffer_pool.clone();
        let pool_b = self.buffer_pool.clone();

        let c2b = copy_with_pooled_buffer(&mut client_rd, &mut backend_wr, pool_a);
        let b2c = copy_with_pooled_buffer(&mut backend_rd, &mut client_wr, pool_b);

        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = c2b => {}
            _ = b2c => {}
        }
    }

    /// Fires cancellation for every tracked connection from `addr`.
    /// Swap-removes matched entries so the cancel closures stay valid for
    /// entries still being iterated (per the swap-remove convention this
    /// stack uses for connection-tracking maps).
    pub fn terminate_by_ip(&self, addr: IpAddr) -> usize {
        let matched: Vec<Uuid> = self
            .connections
            .iter()
            .filter(|e| e.value().addr == addr)
            .map(|e| *e.key())
            .collect();
        for id in &matched {
            if let Some((_, conn)) = self.connections.remove(id) {
                conn.cancel.cancel();
            }
        }
        matched.len()
    }

    pub fn service_id(&self) -> &ServiceId {
        &self.service.service_id
    }

    /// Client IPs with at least one spliced connection open right now.
    pub fn list_connections(&self) -> Vec<IpAddr> {
        self.connections.iter().map(|e| e.value().addr).collect()
    }
}

/// Copies from `reader` to `writer` using a single buffer borrowed from the
/// pool for the lifetime of the copy, returned on completion or error.
async fn copy_with_pooled_buffer<R, W>(
    reader: &mut R,
    writer: &mut W,
    pool: Arc<BufferPool>,
) -> io::Result<()>
where
    R: AsyncReadExt + Unpin,
    W: AsyncWriteExt + Unpin,
{
    let mut buf = pool.acquire();
    let result = async {
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                return Ok(());
            }
            writer.write_all(&buf[..n]).await?;
        }
    }
    .await;
    pool.release(buf);
    result
}
