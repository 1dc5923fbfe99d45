use knockgate_application::services::ServiceAccess;
use knockgate_domain::{AccessReason, ServiceId};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct AccessEntry {
    pub service_id: ServiceId,
    pub access_granted: bool,
    pub reasons: Vec<&'static str>,
}

fn reason_str(reason: AccessReason) -> &'static str {
    match reason {
        AccessReason::Blocked => "blocked",
        AccessReason::Permanent => "permanent",
        AccessReason::DnsResolved => "dns_resolved",
        AccessReason::Session => "session",
        AccessReason::SessionServiceAllowed => "session_service_allowed",
        AccessReason::ServiceNotAllowed => "service_not_allowed",
        AccessReason::NotAllowed => "not_allowed",
    }
}

impl From<ServiceAccess> for AccessEntry {
    fn from(a: ServiceAccess) -> Self {
        Self {
            service_id: a.service_id,
            access_granted: a.access_granted,
            reasons: a.reasons.into_iter().map(reason_str).collect(),
        }
    }
}
