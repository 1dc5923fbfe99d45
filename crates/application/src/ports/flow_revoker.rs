use std::net::IpAddr;

use async_trait::async_trait;

/// Port through which the `AccessRevocationCoordinator` reaches the live
/// TCP/UDP forwarders (C8/C9, owned by C10 in infrastructure) to close any
/// flows still open for a revoked IP. Split into two methods so the
/// coordinator can enforce "TCP before UDP" without the implementor having
/// to encode that ordering itself.
#[async_trait]
pub trait FlowRevoker: Send + Sync {
    async fn terminate_tcp_by_ip(&self, addr: IpAddr) -> usize;
    async fn terminate_udp_by_ip(&self, addr: IpAddr) -> usize;
}
