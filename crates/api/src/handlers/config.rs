use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::dto::ConfigSnapshotView;
use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::state::AppState;

pub async fn get_config(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ConfigSnapshotView>, ApiError> {
    auth.require_admin()?;

    let snapshot = state.config_source.current().await;
    Ok(Json(ConfigSnapshotView::new(
        snapshot.generation,
        &snapshot.config,
    )))
}

pub async fn reload_config(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<StatusCode, ApiError> {
    auth.require_admin()?;

    state.config_source.reload().await?;
    Ok(StatusCode::NO_CONTENT)
}
