use std::net::IpAddr;
use std::sync::Arc;

use knockgate_domain::{AccessReason, ServiceId};

use super::allowlist::AllowlistService;
use super::blocklist::BlocklistService;

#[derive(Debug, Clone)]
pub struct ServiceAccess {
    pub service_id: ServiceId,
    pub access_granted: bool,
    pub reasons: Vec<AccessReason>,
}

/// Single entry point HTTP handlers use for service-access introspection
/// (C12): for a given IP and optional session scope, returns a per-service
/// `{access_granted, reasons[]}` view, evaluated permanent > dns_resolved >
/// session.
pub struct AccessDecisionFacade {
    blocklist: Arc<BlocklistService>,
    allowlist: Arc<AllowlistService>,
}

impl AccessDecisionFacade {
    pub fn new(blocklist: Arc<BlocklistService>, allowlist: Arc<AllowlistService>) -> Self {
        Self {
            blocklist,
            allowlist,
        }
    }

    /// `session_allowed_ids` is `None` when the caller has no active
    /// session; `Some(&[])` means "session with unrestricted service scope".
    pub fn evaluate(
        &self,
        addr: IpAddr,
        session_allowed_ids: Option<&[ServiceId]>,
        service_ids: &[ServiceId],
    ) -> Vec<ServiceAccess> {
        if !self.blocklist.is_blocked(addr).allowed {
            return service_ids
                .iter()
                .map(|id| ServiceAccess {
                    service_id: id.clone(),
                    access_granted: false,
                    reasons: vec![AccessReason::Blocked],
                })
                .collect();
        }

        service_ids
            .iter()
            .map(|service_id| {
                let mut reasons = Vec::new();

                let base = self.allowlist.is_allowed(addr);
                match base.reason {
                    AccessReason::Permanent => reasons.push(AccessReason::Permanent),
                    AccessReason::DnsResolved => reasons.push(AccessReason::DnsResolved),
                    AccessReason::Session => reasons.push(AccessReason::Session),
                    _ => {}
                }

                let session_scoped = session_allowed_ids.map(|ids| {
                    ids.is_empty() || ids.iter().any(|id| id.as_ref() == service_id.as_ref())
                });

                let access_granted = match base.reason {
                    AccessReason::Permanent | AccessReason::DnsResolved => true,
                    AccessReason::Session => {
                        if session_scoped.unwrap_or(false) {
                            reasons.push(AccessReason::SessionServiceAllowed);
                            true
                        } else {
                            reasons.push(AccessReason::ServiceNotAllowed);
                            false
                        }
                    }
                    _ => {
                        reasons.push(AccessReason::NotAllowed);
                        false
                    }
                };

                ServiceAccess {
                    service_id: service_id.clone(),
                    access_granted,
                    reasons,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knockgate_domain::NetworkAccessControlConfig;

    #[test]
    fn blocklist_wins_over_everything() {
        let blocklist = Arc::new(BlocklistService::from_config(&NetworkAccessControlConfig {
            blocked_ip_addresses: vec!["10.0.0.1".into()],
            ..Default::default()
        }));
        let allowlist = Arc::new(AllowlistService::from_config(&NetworkAccessControlConfig {
            permanently_allowed_ip_ranges: vec!["10.0.0.1".into()],
            ..Default::default()
        }));
        let facade = AccessDecisionFacade::new(blocklist, allowlist);
        let services: Vec<ServiceId> = vec![Arc::from("svc-a")];
        let result = facade.evaluate("10.0.0.1".parse().unwrap(), None, &services);
        assert!(!result[0].access_granted);
        assert_eq!(result[0].reasons, vec![AccessReason::Blocked]);
    }

    #[test]
    fn permanent_grants_regardless_of_session() {
        let blocklist = Arc::new(BlocklistService::new());
        let allowlist = Arc::new(AllowlistService::from_config(&NetworkAccessControlConfig {
            permanently_allowed_ip_ranges: vec!["10.0.0.2".into()],
            ..Default::default()
        }));
        let facade = AccessDecisionFacade::new(blocklist, allowlist);
        let services: Vec<ServiceId> = vec![Arc::from("svc-a")];
        let result = facade.evaluate("10.0.0.2".parse().unwrap(), None, &services);
        assert!(result[0].access_granted);
    }
}
