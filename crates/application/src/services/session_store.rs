use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use knockgate_domain::{DomainError, Session, SessionId, ServiceId, UserId};
use tokio::sync::Mutex;

/// Session store (C5). The outer map is a concurrent `DashMap`; each
/// session is independently locked so one session's mutation never blocks
/// another's. Two secondary indices support O(1)-ish lookup by IP and by
/// user without scanning the primary map.
pub struct SessionStore {
    sessions: DashMap<SessionId, Arc<Mutex<Session>>>,
    by_ip: DashMap<IpAddr, HashSet<SessionId>>,
    by_user: DashMap<UserId, HashSet<SessionId>>,
    live_count: AtomicU64,
    max_concurrent_sessions: u64,
    default_duration: Duration,
}

impl SessionStore {
    pub fn new(max_concurrent_sessions: u64, default_duration: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            by_ip: DashMap::new(),
            by_user: DashMap::new(),
            live_count: AtomicU64::new(0),
            max_concurrent_sessions,
            default_duration,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &self,
        user_id: UserId,
        username: Arc<str>,
        initial_ip: IpAddr,
        allowed_service_ids: Vec<ServiceId>,
        is_admin: bool,
        auto_extend: bool,
        max_duration: Option<Duration>,
    ) -> Result<Arc<Mutex<Session>>, DomainError> {
        if self.max_concurrent_sessions > 0
            && self.live_count.load(Ordering::Acquire) >= self.max_concurrent_sessions
        {
            return Err(DomainError::ResourceLimit(
                "max_concurrent_sessions reached".into(),
            ));
        }

        let session = Session::new(
            user_id.clone(),
            username,
            initial_ip,
            allowed_service_ids,
            is_admin,
            self.default_duration,
            auto_extend,
            max_duration,
        );
        let session_id = session.session_id;
        let handle = Arc::new(Mutex::new(session));

        self.sessions.insert(session_id, handle.clone());
        self.by_ip.entry(initial_ip).or_default().insert(session_id);
        self.by_user.entry(user_id).or_default().insert(session_id);
        self.live_count.fetch_add(1, Ordering::AcqRel);

        Ok(handle)
    }

    /// Looks a session up by id. Expired sessions self-terminate on lookup
    /// rather than waiting for the background sweep, so a caller never
    /// observes a handle that's already past its `expires_at`.
    pub async fn get(&self, session_id: SessionId) -> Option<Arc<Mutex<Session>>> {
        let handle = self.sessions.get(&session_id).map(|e| e.clone())?;
        let expired = handle.lock().await.is_expired();
        if expired {
            self.terminate(session_id);
            return None;
        }
        Some(handle)
    }

    pub async fn get_by_ip(&self, addr: IpAddr) -> Vec<Arc<Mutex<Session>>> {
        let ids: Vec<SessionId> = self
            .by_ip
            .get(&addr)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        let mut live = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(handle) = self.get(id).await {
                live.push(handle);
            }
        }
        live
    }

    pub async fn add_ip(&self, session_id: SessionId, addr: IpAddr) -> Result<bool, DomainError> {
        let handle = self
            .get(session_id)
            .await
            .ok_or_else(|| DomainError::NotFound(format!("session {session_id}")))?;
        let added = {
            let mut session = handle.lock().await;
            session.add_ip(addr)
        };
        if added {
            self.by_ip.entry(addr).or_default().insert(session_id);
        }
        Ok(added)
    }

    pub async fn record_activity(&self, session_id: SessionId) -> Result<(), DomainError> {
        let handle = self
            .get(session_id)
            .await
            .ok_or_else(|| DomainError::NotFound(format!("session {session_id}")))?;
        let mut session = handle.lock().await;
        session.record_activity(self.default_duration);
        Ok(())
    }

    pub async fn extend(&self, session_id: SessionId, duration: Duration) -> Result<(), DomainError> {
        let handle = self
            .get(session_id)
            .await
            .ok_or_else(|| DomainError::NotFound(format!("session {session_id}")))?;
        let mut session = handle.lock().await;
        session.extend(duration);
        Ok(())
    }

    pub async fn can_extend(&self, session_id: SessionId) -> Result<bool, DomainError> {
        let handle = self
            .get(session_id)
            .await
            .ok_or_else(|| DomainError::NotFound(format!("session {session_id}")))?;
        let session = handle.lock().await;
        Ok(session.can_extend())
    }

    /// Removes the session from all indices. Does not touch the allowlist
    /// or any forwarder — that propagation is the
    /// `AccessRevocationCoordinator`'s job, not this store's.
    pub fn terminate(&self, session_id: SessionId) -> Option<Arc<Mutex<Session>>> {
        let removed = self.sessions.remove(&session_id).map(|(_, v)| v);
        if removed.is_some() {
            self.live_count.fetch_sub(1, Ordering::AcqRel);
        }
        for mut entry in self.by_ip.iter_mut() {
            entry.remove(&session_id);
        }
        for mut entry in self.by_user.iter_mut() {
            entry.remove(&session_id);
        }
        removed
    }

    /// Scans for expired sessions and terminates them. Intended to be
    /// called by `jobs::SessionCleanupJob` on its sweep interval.
    pub async fn sweep_expired(&self) -> Vec<SessionId> {
        let mut expired = Vec::new();
        for entry in self.sessions.iter() {
            let session = entry.value().lock().await;
            if session.is_expired() {
                expired.push(*entry.key());
            }
        }
        for id in &expired {
            self.terminate(*id);
        }
        expired
    }

    pub fn live_count(&self) -> u64 {
        self.live_count.load(Ordering::Acquire)
    }

    pub fn list_all(&self) -> Vec<Arc<Mutex<Session>>> {
        self.sessions.iter().map(|e| e.value().clone()).collect()
    }
}
