//! Admin HTTP API: login/logout, session management, live-connection
//! introspection, the access-decision facade, and config inspection/reload.
//! Every handler past `/api/health` and `/api/auth/login` requires a
//! bearer session token; admin-only handlers additionally require the
//! caller's session to carry the admin convention (see DESIGN.md).

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use routes::create_api_routes;
pub use state::AppState;
