/// Why an access check resolved the way it did. Ordering of the variants
/// here mirrors evaluation priority, highest first, for callers that want
/// to sort or compare reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessReason {
    Blocked,
    Permanent,
    DnsResolved,
    Session,
    SessionServiceAllowed,
    ServiceNotAllowed,
    NotAllowed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: AccessReason,
}

impl AccessDecision {
    pub const fn blocked() -> Self {
        Self {
            allowed: false,
            reason: AccessReason::Blocked,
        }
    }

    pub const fn not_allowed() -> Self {
        Self {
            allowed: false,
            reason: AccessReason::NotAllowed,
        }
    }

    pub const fn allow(reason: AccessReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }
}
