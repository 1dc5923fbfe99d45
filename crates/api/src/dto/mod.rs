pub mod access;
pub mod auth;
pub mod config;
pub mod connection;
pub mod session;

pub use access::AccessEntry;
pub use auth::{LoginRequest, LoginResponse};
pub use config::ConfigSnapshotView;
pub use connection::{ConnectionEntry, TerminateConnectionsResponse};
pub use session::{AddIpResponse, ExtendSessionResponse, SessionSummary};
