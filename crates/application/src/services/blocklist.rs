use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use ipnetwork::IpNetwork;
use knockgate_domain::{AccessDecision, NetworkAccessControlConfig};

/// Highest-priority deny list (C3). Two structures swapped together so a
/// reload is a single atomic pointer replace, matching the block-index
/// hot-swap idiom used elsewhere in this stack.
struct BlocklistIndex {
    exact: HashSet<IpAddr>,
    prefixes: Vec<IpNetwork>,
}

pub struct BlocklistService {
    index: ArcSwap<BlocklistIndex>,
}

impl BlocklistService {
    pub fn new() -> Self {
        Self {
            index: ArcSwap::from_pointee(BlocklistIndex {
                exact: HashSet::new(),
                prefixes: Vec::new(),
            }),
        }
    }

    pub fn from_config(cfg: &NetworkAccessControlConfig) -> Self {
        let svc = Self::new();
        svc.reload(cfg);
        svc
    }

    /// Must run before every other access check in every code path.
    pub fn is_blocked(&self, addr: IpAddr) -> AccessDecision {
        let index = self.index.load();
        if index.exact.contains(&addr) || index.prefixes.iter().any(|net| net.contains(addr)) {
            AccessDecision::blocked()
        } else {
            AccessDecision {
                allowed: true,
                reason: knockgate_domain::AccessReason::NotAllowed,
            }
        }
    }

    pub fn reload(&self, cfg: &NetworkAccessControlConfig) {
        let mut exact = HashSet::new();
        let mut prefixes = Vec::new();
        for entry in &cfg.blocked_ip_addresses {
            match knockgate_domain::IpEntry::parse(entry) {
                Ok(knockgate_domain::IpEntry::Exact(addr)) => {
                    exact.insert(addr);
                }
                Ok(knockgate_domain::IpEntry::Cidr(net)) => prefixes.push(net),
                Err(e) => tracing::warn!(entry, error = %e, "skipping invalid blocklist entry"),
            }
        }
        self.index
            .store(Arc::new(BlocklistIndex { exact, prefixes }));
    }
}

impl Default for BlocklistService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_exact_and_cidr() {
        let cfg = NetworkAccessControlConfig {
            blocked_ip_addresses: vec!["192.0.2.1".into(), "198.51.100.0/24".into()],
            ..Default::default()
        };
        let svc = BlocklistService::from_config(&cfg);
        assert!(!svc.is_blocked("192.0.2.1".parse().unwrap()).allowed);
        assert!(!svc.is_blocked("198.51.100.50".parse().unwrap()).allowed);
        assert!(svc.is_blocked("203.0.113.1".parse().unwrap()).allowed);
    }

    #[test]
    fn reload_replaces_atomically() {
        let svc = BlocklistService::new();
        assert!(svc.is_blocked("192.0.2.1".parse().unwrap()).allowed);
        svc.reload(&NetworkAccessControlConfig {
            blocked_ip_addresses: vec!["192.0.2.1".into()],
            ..Default::default()
        });
        assert!(!svc.is_blocked("192.0.2.1".parse().unwrap()).allowed);
    }
}
