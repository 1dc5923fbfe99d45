use chrono::{DateTime, Utc};
use knockgate_domain::SessionId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub session_id: SessionId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}
