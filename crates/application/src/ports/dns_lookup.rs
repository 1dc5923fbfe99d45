use std::collections::HashSet;
use std::net::IpAddr;

use async_trait::async_trait;
use knockgate_domain::DomainError;

/// Application-layer port for resolving a single hostname to its A/AAAA
/// addresses, following any CNAME chain (C2's collaborator). Kept narrow so
/// the DNS refresh job is testable against a fake without a real resolver.
#[async_trait]
pub trait DnsLookup: Send + Sync {
    async fn resolve(&self, hostname: &str) -> Result<HashSet<IpAddr>, DomainError>;
}
