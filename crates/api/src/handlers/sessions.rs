use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use knockgate_domain::{DomainError, SessionId};

use crate::dto::{AddIpResponse, ExtendSessionResponse, SessionSummary};
use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::state::AppState;

fn require_self_or_admin(auth: &AuthContext, target: SessionId) -> Result<(), ApiError> {
    if auth.is_admin || auth.session_id == target {
        Ok(())
    } else {
        Err(ApiError(DomainError::Forbidden(
            "cannot act on another user's session".into(),
        )))
    }
}

pub async fn extend(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    auth: AuthContext,
) -> Result<Json<ExtendSessionResponse>, ApiError> {
    require_self_or_admin(&auth, session_id)?;

    if !state.sessions.can_extend(session_id).await? {
        return Err(ApiError(DomainError::Forbidden(
            "session is not eligible for extension".into(),
        )));
    }

    let snapshot = state.config_source.current().await;
    let duration = std::time::Duration::from_secs(
        snapshot.config.session_config.default_session_duration_seconds,
    );
    state.sessions.extend(session_id, duration).await?;

    let handle = state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| ApiError(DomainError::NotFound(format!("session {session_id}"))))?;
    let session = handle.lock().await;
    state
        .allowlist
        .add_session_ip(session.session_id, auth.client_ip, session.expires_at);

    Ok(Json(ExtendSessionResponse {
        expires_at: session.expires_at,
    }))
}

pub async fn add_ip(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    auth: AuthContext,
) -> Result<Json<AddIpResponse>, ApiError> {
    require_self_or_admin(&auth, session_id)?;

    let added = state.sessions.add_ip(session_id, auth.client_ip).await?;

    let handle = state
        .sessions
        .get(session_id)
        .await
        .ok_or_else(|| ApiError(DomainError::NotFound(format!("session {session_id}"))))?;
    let session = handle.lock().await;
    if added {
        state
            .allowlist
            .add_session_ip(session.session_id, auth.client_ip, session.expires_at);
    }

    Ok(Json(AddIpResponse { added }))
}

pub async fn list(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    auth.require_admin()?;

    let summaries = state
        .sessions
        .list_all()
        .into_iter()
        .collect::<Vec<_>>();

    let mut out = Vec::with_capacity(summaries.len());
    for handle in summaries {
        let session = handle.lock().await;
        out.push(SessionSummary::from(&*session));
    }

    Ok(Json(out))
}

pub async fn terminate(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
    auth: AuthContext,
) -> Result<StatusCode, ApiError> {
    auth.require_admin()?;
    state.revocation.terminate_session(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
