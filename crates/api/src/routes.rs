use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers;
use crate::handlers::{connections, sessions};
use crate::state::AppState;

/// Builds the full admin API route table. Requires the router be served
/// with `into_make_service_with_connect_info::<SocketAddr>()` so
/// `AuthContext` and the login handler can see the peer address.
pub fn create_api_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health_check))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/sessions/{id}/extend", post(sessions::extend))
        .route("/api/sessions/{id}/ips", post(sessions::add_ip))
        .route("/api/sessions", get(sessions::list))
        .route("/api/sessions/{id}", delete(sessions::terminate))
        .route("/api/connections", get(connections::list))
        .route("/api/connections/{ip}", delete(connections::terminate))
        .route("/api/access", get(handlers::get_access))
        .route("/api/config", get(handlers::get_config))
        .route("/api/config/reload", post(handlers::reload_config))
        .with_state(state)
}
