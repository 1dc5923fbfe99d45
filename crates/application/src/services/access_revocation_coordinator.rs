use std::sync::Arc;

use knockgate_domain::{DomainError, SessionId};
use tracing::info;

use crate::ports::FlowRevoker;

use super::allowlist::AllowlistService;
use super::session_store::SessionStore;

/// The single code path that performs session termination's mandated
/// ordering: (a) store removal, (b) allowlist IP removal, (c) TCP
/// cancellation, (d) UDP cancellation. Both the admin API and the sweep job
/// call through here so the ordering invariant lives in one place.
pub struct AccessRevocationCoordinator {
    sessions: Arc<SessionStore>,
    allowlist: Arc<AllowlistService>,
    flow_revoker: Arc<dyn FlowRevoker>,
}

impl AccessRevocationCoordinator {
    pub fn new(
        sessions: Arc<SessionStore>,
        allowlist: Arc<AllowlistService>,
        flow_revoker: Arc<dyn FlowRevoker>,
    ) -> Self {
        Self {
            sessions,
            allowlist,
            flow_revoker,
        }
    }

    /// Terminates `session_id` end to end. Safe to call on an
    /// already-missing session (from a concurrent terminate/sweep race) —
    /// it still runs the allowlist/flow cleanup using whatever IPs the
    /// session held.
    pub async fn terminate_session(&self, session_id: SessionId) -> Result<(), DomainError> {
        let removed = self.sessions.terminate(session_id);

        let ips = if let Some(handle) = &removed {
            handle.lock().await.authenticated_ips().to_vec()
        } else {
            Vec::new()
        };

        self.allowlist.remove_session(session_id);

        for addr in &ips {
            let tcp_count = self.flow_revoker.terminate_tcp_by_ip(*addr).await;
            let udp_count = self.flow_revoker.terminate_udp_by_ip(*addr).await;
            info!(%session_id, %addr, tcp_count, udp_count, "revoked flows for terminated session");
        }

        Ok(())
    }
}
