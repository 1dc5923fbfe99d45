use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use knockgate_domain::{DomainError, ServiceId, SessionId, UserId};

use crate::error::ApiError;
use crate::state::AppState;

/// The caller's session plus the effective client IP (C11), resolved once
/// per request from the `Authorization: Bearer <token>` header. Every
/// handler that requires an authenticated caller takes this as an
/// extractor argument; admin-only handlers additionally call
/// `require_admin`.
pub struct AuthContext {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub username: Arc<str>,
    pub allowed_service_ids: Vec<ServiceId>,
    pub is_admin: bool,
    pub client_ip: IpAddr,
}

impl AuthContext {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(ApiError(DomainError::Forbidden(
                "admin privileges required".into(),
            )))
        }
    }
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(ApiError(DomainError::Unauthorized))?;

        let session_id = state
            .token_issuer
            .verify(token)
            .ok_or(ApiError(DomainError::Unauthorized))?;

        let handle = state
            .sessions
            .get(session_id)
            .await
            .ok_or(ApiError(DomainError::Unauthorized))?;

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or_else(|| ApiError(DomainError::Internal("missing connect info".into())))?;

        let header_pairs: Vec<(&str, &str)> = parts
            .headers
            .iter()
            .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?)))
            .collect();
        let client_ip = state.real_ip.extract(peer, header_pairs);

        let session = handle.lock().await;
        if session.is_expired() {
            return Err(ApiError(DomainError::Unauthorized));
        }

        Ok(AuthContext {
            session_id: session.session_id,
            user_id: session.user_id.clone(),
            username: session.username.clone(),
            allowed_service_ids: session.allowed_service_ids.clone(),
            is_admin: session.is_admin,
            client_ip,
        })
    }
}
