use std::collections::HashSet;
use std::net::IpAddr;

use async_trait::async_trait;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::Resolver;
use knockgate_application::ports::DnsLookup;
use knockgate_domain::DomainError;
use tracing::{debug, warn};

/// Resolves hostnames in `allowed_dynamic_dns_hostnames` to their current A
/// and AAAA records (C2). Built on the system resolver configuration; "no
/// records found" for either family is not an error, just an empty set for
/// that family.
pub struct HickoryDnsLookup {
    resolver: Resolver<TokioConnectionProvider>,
}

impl HickoryDnsLookup {
    pub fn new() -> Self {
        let resolver = Resolver::builder_with_config(
            ResolverConfig::default(),
            TokioConnectionProvider::default(),
        )
        .build();
        Self { resolver }
    }
}

impl Default for HickoryDnsLookup {
    fn default() -> Self {
        Self::new()
    }
}

fn is_no_records(e: &hickory_resolver::ResolveError) -> bool {
    let msg = e.to_string();
    msg.contains("no records found") || msg.contains("NoRecordsFound")
}

#[async_trait]
impl DnsLookup for HickoryDnsLookup {
    async fn resolve(&self, hostname: &str) -> Result<HashSet<IpAddr>, DomainError> {
        let mut addrs = HashSet::new();

        match self.resolver.ipv4_lookup(hostname).await {
            Ok(response) => {
                addrs.extend(response.iter().map(|r| IpAddr::V4(r.0)));
            }
            Err(e) if is_no_records(&e) => {
                debug!(%hostname, "no A records found");
            }
            Err(e) => {
                warn!(%hostname, error = %e, "A lookup failed");
                return Err(DomainError::Internal(format!(
                    "dns lookup failed for {hostname}: {e}"
                )));
            }
        }

        match self.resolver.ipv6_lookup(hostname).await {
            Ok(response) => {
                addrs.extend(response.iter().map(|r| IpAddr::V6(r.0)));
            }
            Err(e) if is_no_records(&e) => {
                debug!(%hostname, "no AAAA records found");
            }
            Err(e) => {
                warn!(%hostname, error = %e, "AAAA lookup failed");
                if addrs.is_empty() {
                    return Err(DomainError::Internal(format!(
                        "dns lookup failed for {hostname}: {e}"
                    )));
                }
            }
        }

        debug!(%hostname, count = addrs.len(), "resolved");
        Ok(addrs)
    }
}
