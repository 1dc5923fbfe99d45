use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use knockgate_domain::DomainError;
use tracing::{info, warn};

use crate::dto::{LoginRequest, LoginResponse};
use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::state::AppState;

pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let header_pairs: Vec<(&str, &str)> = headers
        .iter()
        .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?)))
        .collect();
    let client_ip = state.real_ip.extract(peer.ip(), header_pairs);

    if !state.blocklist.is_blocked(client_ip).allowed {
        return Err(ApiError(DomainError::Forbidden("blocked".into())));
    }

    if !state.rate_limiter.allow(client_ip) {
        // the bucket doesn't expose its own next-refill time, so this is a
        // fixed conservative estimate rather than a computed one.
        return Err(ApiError(DomainError::RateLimited {
            retry_after_secs: 60,
        }));
    }

    let snapshot = state.config_source.current().await;
    let user = snapshot
        .config
        .portal_user_accounts
        .iter()
        .find(|u| u.username == req.username)
        .cloned();

    let Some(user) = user else {
        state.rate_limiter.record_failure(client_ip);
        warn!(username = %req.username, "login attempt for unknown user");
        return Err(ApiError(DomainError::Unauthorized));
    };

    let verified = state
        .credential_verifier
        .verify(&req.password, &user.bcrypt_hashed_password)
        .await?;

    if !verified {
        state.rate_limiter.record_failure(client_ip);
        warn!(username = %req.username, "login attempt with bad password");
        return Err(ApiError(DomainError::Unauthorized));
    }

    state.rate_limiter.record_success(client_ip);

    let allowed_service_ids = user
        .allowed_service_ids
        .iter()
        .map(|s| s.as_str().into())
        .collect();
    let max_duration = snapshot
        .config
        .session_config
        .maximum_session_duration_seconds
        .map(Duration::from_secs);

    let handle = state.sessions.create(
        user.user_id.as_str().into(),
        user.username.as_str().into(),
        client_ip,
        allowed_service_ids,
        user.is_admin(),
        snapshot.config.session_config.auto_extend_session_on_connection,
        max_duration,
    )?;

    let session = handle.lock().await;
    let token = state.token_issuer.issue(&session)?;
    state
        .allowlist
        .add_session_ip(session.session_id, client_ip, session.expires_at);

    info!(username = %req.username, session_id = %session.session_id, "login succeeded");

    Ok(Json(LoginResponse {
        session_id: session.session_id,
        token,
        expires_at: session.expires_at,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<StatusCode, ApiError> {
    state.revocation.terminate_session(auth.session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
