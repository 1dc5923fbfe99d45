use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{DomainError, ServiceId, UserId};

pub type SessionId = Uuid;

/// An authenticated portal session. Created on login, destroyed on logout,
/// admin termination, expiry sweep, or hitting `max_duration`.
///
/// Invariants (checked in `Session::new`, preserved by every mutator):
/// `created_at <= last_activity_at <= expires_at`; if `max_duration` is set
/// then `expires_at <= created_at + max_duration`; `authenticated_ips`
/// contains no duplicates, with the login IP always at index 0.
#[derive(Debug, Clone)]
pub struct Session {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub username: Arc<str>,
    authenticated_ips: Vec<IpAddr>,
    pub allowed_service_ids: Vec<ServiceId>,
    /// Copied from `User::is_admin()` at login time — a session's admin
    /// standing does not change even if the backing account is edited
    /// before the session expires.
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub auto_extend: bool,
    pub max_duration: Option<Duration>,
}

impl Session {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: UserId,
        username: Arc<str>,
        initial_ip: IpAddr,
        allowed_service_ids: Vec<ServiceId>,
        is_admin: bool,
        default_duration: Duration,
        auto_extend: bool,
        max_duration: Option<Duration>,
    ) -> Self {
        let now = Utc::now();
        let mut expires_at = now + chrono_duration(default_duration);
        if let Some(max) = max_duration {
            let ceiling = now + chrono_duration(max);
            if expires_at > ceiling {
                expires_at = ceiling;
            }
        }
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            username,
            authenticated_ips: vec![initial_ip],
            allowed_service_ids,
            is_admin,
            created_at: now,
            last_activity_at: now,
            expires_at,
            auto_extend,
            max_duration,
        }
    }

    pub fn authenticated_ips(&self) -> &[IpAddr] {
        &self.authenticated_ips
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn is_allowed_service(&self, service_id: &str) -> bool {
        self.allowed_service_ids.is_empty()
            || self
                .allowed_service_ids
                .iter()
                .any(|id| id.as_ref() == service_id)
    }

    /// No-op if `addr` is already attached; otherwise appended.
    pub fn add_ip(&mut self, addr: IpAddr) -> bool {
        if self.authenticated_ips.contains(&addr) {
            return false;
        }
        self.authenticated_ips.push(addr);
        true
    }

    /// `auto_extend && (max_duration unset || now < created_at + max_duration)`.
    pub fn can_extend(&self) -> bool {
        self.auto_extend
            && self
                .max_duration
                .map(|max| Utc::now() < self.created_at + chrono_duration(max))
                .unwrap_or(true)
    }

    /// `new = now + duration`, clamped to `created_at + max_duration` if set.
    pub fn extend(&mut self, duration: Duration) {
        let now = Utc::now();
        let mut new_expiry = now + chrono_duration(duration);
        if let Some(max) = self.max_duration {
            let ceiling = self.created_at + chrono_duration(max);
            if new_expiry > ceiling {
                new_expiry = ceiling;
            }
        }
        self.expires_at = new_expiry;
        self.last_activity_at = now;
    }

    /// If `auto_extend` and extension is still permitted, extend by
    /// `default_duration`; otherwise just touch `last_activity_at`.
    pub fn record_activity(&mut self, default_duration: Duration) {
        if self.can_extend() {
            self.extend(default_duration);
        } else {
            self.last_activity_at = Utc::now();
        }
    }

    pub fn validate_invariants(&self) -> Result<(), DomainError> {
        if self.created_at > self.last_activity_at || self.last_activity_at > self.expires_at {
            return Err(DomainError::Internal(
                "session timestamps out of order".into(),
            ));
        }
        if let Some(max) = self.max_duration {
            if self.expires_at > self.created_at + chrono_duration(max) {
                return Err(DomainError::Internal(
                    "session expiry exceeds max_duration".into(),
                ));
            }
        }
        let mut seen = std::collections::HashSet::new();
        if !self.authenticated_ips.iter().all(|ip| seen.insert(*ip)) {
            return Err(DomainError::Internal(
                "duplicate IP in authenticated_ips".into(),
            ));
        }
        Ok(())
    }
}

fn chrono_duration(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk(max: Option<Duration>) -> Session {
        Session::new(
            Arc::from("u1"),
            Arc::from("alice"),
            "192.0.2.10".parse().unwrap(),
            vec![],
            false,
            Duration::from_secs(3600),
            true,
            max,
        )
    }

    #[test]
    fn new_session_satisfies_invariants() {
        let s = mk(Some(Duration::from_secs(7200)));
        assert!(s.validate_invariants().is_ok());
        assert_eq!(s.authenticated_ips(), &["192.0.2.10".parse::<IpAddr>().unwrap()]);
    }

    #[test]
    fn add_ip_is_idempotent() {
        let mut s = mk(None);
        let extra: IpAddr = "192.0.2.11".parse().unwrap();
        assert!(s.add_ip(extra));
        assert!(!s.add_ip(extra));
        assert_eq!(s.authenticated_ips().len(), 2);
    }

    #[test]
    fn extend_is_clamped_by_max_duration() {
        let mut s = mk(Some(Duration::from_secs(10)));
        s.extend(Duration::from_secs(3600));
        assert!(s.expires_at <= s.created_at + chrono::Duration::seconds(10));
    }

    #[test]
    fn can_extend_false_past_max_duration_window() {
        let mut s = mk(Some(Duration::from_secs(1)));
        s.created_at -= chrono::Duration::seconds(5);
        assert!(!s.can_extend());
    }
}
