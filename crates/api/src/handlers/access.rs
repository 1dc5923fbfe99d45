use axum::extract::State;
use axum::Json;

use crate::dto::AccessEntry;
use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::state::AppState;

pub async fn get_access(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<AccessEntry>>, ApiError> {
    let snapshot = state.config_source.current().await;
    let service_ids: Vec<_> = snapshot
        .config
        .protected_services
        .iter()
        .filter(|s| s.enabled)
        .map(|s| s.service_id.as_str().into())
        .collect();

    let decisions = state.access_facade.evaluate(
        auth.client_ip,
        Some(auth.allowed_service_ids.as_slice()),
        &service_ids,
    );

    Ok(Json(decisions.into_iter().map(AccessEntry::from).collect()))
}
