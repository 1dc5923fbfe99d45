use std::net::IpAddr;

use chrono::{DateTime, Utc};
use knockgate_domain::{ServiceId, Session, SessionId, UserId};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub username: String,
    pub authenticated_ips: Vec<IpAddr>,
    pub allowed_service_ids: Vec<ServiceId>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<&Session> for SessionSummary {
    fn from(s: &Session) -> Self {
        Self {
            session_id: s.session_id,
            user_id: s.user_id.clone(),
            username: s.username.to_string(),
            authenticated_ips: s.authenticated_ips().to_vec(),
            allowed_service_ids: s.allowed_service_ids.clone(),
            is_admin: s.is_admin,
            created_at: s.created_at,
            last_activity_at: s.last_activity_at,
            expires_at: s.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExtendSessionResponse {
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AddIpResponse {
    pub added: bool,
}
