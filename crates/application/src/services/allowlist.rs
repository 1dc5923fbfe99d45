use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use ipnetwork::IpNetwork;
use knockgate_domain::{AccessDecision, AccessReason, IpEntry, NetworkAccessControlConfig, SessionId};

struct PermanentIndex {
    exact: HashSet<IpAddr>,
    prefixes: Vec<IpNetwork>,
}

#[derive(Clone, Copy)]
struct SessionGrant {
    session_id: SessionId,
    expires_at: DateTime<Utc>,
}

/// Multi-source allow decision (C4): permanent ranges, DNS-resolved
/// addresses, and session grants, each in its own partition so a reload of
/// one never disturbs the others.
pub struct AllowlistService {
    permanent: ArcSwap<PermanentIndex>,
    dns_exact: ArcSwap<HashMap<IpAddr, Arc<str>>>,
    session_exact: DashMap<IpAddr, SessionGrant>,
    session_index: DashMap<SessionId, HashSet<IpAddr>>,
}

impl AllowlistService {
    pub fn new() -> Self {
        Self {
            permanent: ArcSwap::from_pointee(PermanentIndex {
                exact: HashSet::new(),
                prefixes: Vec::new(),
            }),
            dns_exact: ArcSwap::from_pointee(HashMap::new()),
            session_exact: DashMap::new(),
            session_index: DashMap::new(),
        }
    }

    pub fn from_config(cfg: &NetworkAccessControlConfig) -> Self {
        let svc = Self::new();
        svc.reload_permanent(cfg);
        svc
    }

    /// 1. DNS exact hit -> dns_resolved. 2. Permanent-or-session exact hit
    /// (not expired) -> that reason. 3. Permanent CIDR containment ->
    /// permanent. 4. Otherwise not_allowed. Expired session entries found
    /// along the way are lazily evicted.
    pub fn is_allowed(&self, addr: IpAddr) -> AccessDecision {
        if self.dns_exact.load().contains_key(&addr) {
            return AccessDecision::allow(AccessReason::DnsResolved);
        }

        if self.permanent.load().exact.contains(&addr) {
            return AccessDecision::allow(AccessReason::Permanent);
        }

        if let Some(entry) = self.session_exact.get(&addr) {
            let grant = *entry;
            drop(entry);
            if grant.expires_at > Utc::now() {
                return AccessDecision::allow(AccessReason::Session);
            }
            self.evict_session_ip(addr, grant.session_id);
        }

        if self.permanent.load().prefixes.iter().any(|net| net.contains(addr)) {
            return AccessDecision::allow(AccessReason::Permanent);
        }

        AccessDecision::not_allowed()
    }

    /// `is_allowed` plus a service-scope check. `session_allowed_ids` is the
    /// set of service ids the *session that currently grants this IP* is
    /// scoped to — pass an empty slice for "all services".
    pub fn is_allowed_for_service(
        &self,
        addr: IpAddr,
        service_id: &str,
        session_allowed_ids: &[Arc<str>],
    ) -> AccessDecision {
        let base = self.is_allowed(addr);
        if !base.allowed {
            return base;
        }
        match base.reason {
            AccessReason::Permanent | AccessReason::DnsResolved => base,
            AccessReason::Session => {
                if session_allowed_ids.is_empty()
                    || session_allowed_ids.iter().any(|id| id.as_ref() == service_id)
                {
                    AccessDecision::allow(AccessReason::SessionServiceAllowed)
                } else {
                    AccessDecision {
                        allowed: false,
                        reason: AccessReason::ServiceNotAllowed,
                    }
                }
            }
            _ => base,
        }
    }

    pub fn add_session_ip(&self, session_id: SessionId, addr: IpAddr, expires_at: DateTime<Utc>) {
        self.session_exact.insert(
            addr,
            SessionGrant {
                session_id,
                expires_at,
            },
        );
        self.session_index
            .entry(session_id)
            .or_default()
            .insert(addr);
    }

    /// Removes every IP this session granted. O(1) amortized via the
    /// reverse index rather than scanning the exact map.
    pub fn remove_session(&self, session_id: SessionId) {
        if let Some((_, addrs)) = self.session_index.remove(&session_id) {
            for addr in addrs {
                self.session_exact.remove(&addr);
            }
        }
    }

    fn evict_session_ip(&self, addr: IpAddr, session_id: SessionId) {
        self.session_exact.remove(&addr);
        if let Some(mut addrs) = self.session_index.get_mut(&session_id) {
            addrs.remove(&addr);
        }
    }

    pub fn reload_permanent(&self, cfg: &NetworkAccessControlConfig) {
        let mut exact = HashSet::new();
        let mut prefixes = Vec::new();
        for entry in &cfg.permanently_allowed_ip_ranges {
            match IpEntry::parse(entry) {
                Ok(IpEntry::Exact(addr)) => {
                    exact.insert(addr);
                }
                Ok(IpEntry::Cidr(net)) => prefixes.push(net),
                Err(e) => tracing::warn!(entry, error = %e, "skipping invalid permanent allowlist entry"),
            }
        }
        self.permanent
            .store(Arc::new(PermanentIndex { exact, prefixes }));
    }

    /// Replaces the whole DNS-resolved set. Called once per refresh round;
    /// hostnames that failed to resolve this round keep nothing here (the
    /// caller merges with the previous round's results before calling this
    /// so transient failures don't clear existing entries).
    pub fn replace_dns_resolved(&self, addrs: HashMap<IpAddr, Arc<str>>) {
        self.dns_exact.store(Arc::new(addrs));
    }
}

impl Default for AllowlistService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn permanent_exact_and_cidr() {
        let cfg = NetworkAccessControlConfig {
            permanently_allowed_ip_ranges: vec!["192.0.2.1".into(), "198.51.100.0/24".into()],
            ..Default::default()
        };
        let svc = AllowlistService::from_config(&cfg);
        assert!(svc.is_allowed("192.0.2.1".parse().unwrap()).allowed);
        assert!(svc.is_allowed("198.51.100.9".parse().unwrap()).allowed);
        assert!(!svc.is_allowed("203.0.113.1".parse().unwrap()).allowed);
    }

    #[test]
    fn session_grant_then_removal() {
        let svc = AllowlistService::new();
        let sid = Uuid::new_v4();
        let addr: IpAddr = "10.0.0.5".parse().unwrap();
        svc.add_session_ip(sid, addr, Utc::now() + chrono::Duration::seconds(60));
        let d = svc.is_allowed(addr);
        assert!(d.allowed);
        assert_eq!(d.reason, AccessReason::Session);
        svc.remove_session(sid);
        assert!(!svc.is_allowed(addr).allowed);
    }

    #[test]
    fn expired_session_grant_is_evicted_lazily() {
        let svc = AllowlistService::new();
        let sid = Uuid::new_v4();
        let addr: IpAddr = "10.0.0.6".parse().unwrap();
        svc.add_session_ip(sid, addr, Utc::now() - chrono::Duration::seconds(1));
        assert!(!svc.is_allowed(addr).allowed);
        assert!(svc.session_exact.is_empty());
    }

    #[test]
    fn dns_priority_over_permanent() {
        let svc = AllowlistService::new();
        let addr: IpAddr = "10.0.0.7".parse().unwrap();
        let mut m = HashMap::new();
        m.insert(addr, Arc::from("example.com"));
        svc.replace_dns_resolved(m);
        let d = svc.is_allowed(addr);
        assert_eq!(d.reason, AccessReason::DnsResolved);
    }

    #[test]
    fn service_scoping_on_session_grant() {
        let svc = AllowlistService::new();
        let sid = Uuid::new_v4();
        let addr: IpAddr = "10.0.0.8".parse().unwrap();
        svc.add_session_ip(sid, addr, Utc::now() + chrono::Duration::seconds(60));
        let allowed_ids: Vec<Arc<str>> = vec![Arc::from("svc-a")];
        assert!(svc
            .is_allowed_for_service(addr, "svc-a", &allowed_ids)
            .allowed);
        assert!(!svc
            .is_allowed_for_service(addr, "svc-b", &allowed_ids)
            .allowed);
    }
}
