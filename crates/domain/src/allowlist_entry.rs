use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use ipnetwork::IpNetwork;

use crate::SessionId;

/// One entry in the allowlist's permanent/dns/session partitions.
#[derive(Debug, Clone)]
pub enum AllowlistEntry {
    /// Configured range, no expiry. `prefix` is `None` for a bare address
    /// (carried as a /32 or /128 network so both partitions share storage).
    Permanent {
        prefix: IpNetwork,
        added_at: DateTime<Utc>,
    },
    /// Resolved from a configured hostname. Owned exclusively by the DNS
    /// refresh job; replaced wholesale each refresh round.
    Dns {
        addr: IpAddr,
        original_hostname: Arc<str>,
        added_at: DateTime<Utc>,
    },
    /// Granted by an active session. Expires with the session.
    Session {
        addr: IpAddr,
        session_id: SessionId,
        added_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
}

impl AllowlistEntry {
    pub fn is_expired(&self) -> bool {
        match self {
            AllowlistEntry::Permanent { .. } | AllowlistEntry::Dns { .. } => false,
            AllowlistEntry::Session { expires_at, .. } => Utc::now() >= *expires_at,
        }
    }

    pub fn session_id(&self) -> Option<SessionId> {
        match self {
            AllowlistEntry::Session { session_id, .. } => Some(*session_id),
            _ => None,
        }
    }
}
