use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use knockgate_application::ports::DnsLookup;
use knockgate_application::services::AllowlistService;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Keeps the allowlist's DNS-resolved partition in sync with
/// `allowed_dynamic_dns_hostnames` (C2). Resolves once immediately on
/// start, then once per `dns_refresh_interval_seconds`. A hostname that
/// fails to resolve in a given round keeps whatever addresses it
/// contributed last round instead of being zeroed out — a transient
/// resolver hiccup must not evict an authenticated client mid-session.
pub struct DnsRefreshJob {
    dns: Arc<dyn DnsLookup>,
    allowlist: Arc<AllowlistService>,
    hostnames: Vec<String>,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl DnsRefreshJob {
    pub fn new(
        dns: Arc<dyn DnsLookup>,
        allowlist: Arc<AllowlistService>,
        hostnames: Vec<String>,
        interval_secs: u64,
    ) -> Self {
        Self {
            dns,
            allowlist,
            hostnames,
            interval_secs,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    async fn run_round(&self, previous: &HashMap<IpAddr, Arc<str>>) -> HashMap<IpAddr, Arc<str>> {
        let mut next = HashMap::new();
        for hostname in &self.hostnames {
            match self.dns.resolve(hostname).await {
                Ok(addrs) => {
                    for addr in addrs {
                        next.insert(addr, Arc::from(hostname.as_str()));
                    }
                }
                Err(e) => {
                    warn!(hostname, error = %e, "dns refresh failed, keeping previous addresses");
                    for (addr, host) in previous {
                        if host.as_ref() == hostname.as_str() {
                            next.insert(*addr, host.clone());
                        }
                    }
                }
            }
        }
        next
    }

    pub async fn start(self: Arc<Self>) {
        info!(
            interval_secs = self.interval_secs,
            hostnames = self.hostnames.len(),
            "starting dns refresh job"
        );

        tokio::spawn(async move {
            let mut resolved = self.run_round(&HashMap::new()).await;
            self.allowlist.replace_dns_resolved(resolved.clone());
            info!(count = resolved.len(), "initial dns resolution complete");

            let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("dns refresh job shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        resolved = self.run_round(&resolved).await;
                        self.allowlist.replace_dns_resolved(resolved.clone());
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use knockgate_domain::DomainError;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FlakyResolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DnsLookup for FlakyResolver {
        async fn resolve(&self, hostname: &str) -> Result<HashSet<IpAddr>, DomainError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if hostname == "flaky.example.com" && call > 0 {
                return Err(DomainError::Internal("timeout".into()));
            }
            let mut set = HashSet::new();
            set.insert(IpAddr::from([10, 0, 0, call as u8]));
            Ok(set)
        }
    }

    #[tokio::test]
    async fn failed_round_carries_forward_previous_addresses() {
        let dns: Arc<dyn DnsLookup> = Arc::new(FlakyResolver {
            calls: AtomicUsize::new(0),
        });
        let allowlist = Arc::new(AllowlistService::new());
        let job = DnsRefreshJob::new(
            dns,
            allowlist.clone(),
            vec!["flaky.example.com".into()],
            3600,
        );

        let first = job.run_round(&HashMap::new()).await;
        assert_eq!(first.len(), 1);

        let second = job.run_round(&first).await;
        assert_eq!(second, first, "a failed round must keep the previous entries");
    }
}
