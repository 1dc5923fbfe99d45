use std::net::IpAddr;

use axum::extract::{Path, State};
use axum::Json;
use knockgate_application::ports::FlowRevoker;

use crate::dto::{ConnectionEntry, TerminateConnectionsResponse};
use crate::error::ApiError;
use crate::middleware::AuthContext;
use crate::state::AppState;

pub async fn list(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<Vec<ConnectionEntry>>, ApiError> {
    auth.require_admin()?;

    let entries = state
        .forwarders
        .list_connections()
        .into_iter()
        .map(ConnectionEntry::from)
        .collect();

    Ok(Json(entries))
}

pub async fn terminate(
    State(state): State<AppState>,
    Path(addr): Path<IpAddr>,
    auth: AuthContext,
) -> Result<Json<TerminateConnectionsResponse>, ApiError> {
    auth.require_admin()?;

    let tcp = state.forwarders.terminate_tcp_by_ip(addr).await;
    let udp = state.forwarders.terminate_udp_by_ip(addr).await;

    Ok(Json(TerminateConnectionsResponse {
        terminated: tcp + udp,
    }))
}
