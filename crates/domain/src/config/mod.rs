//! Configuration tree for the gateway, organized by domain:
//! - `session`: session TTL/extension/concurrency limits
//! - `network`: blocklist, permanent allowlist, DNS refresh cadence
//! - `proxy`: listener addresses, ports, buffer sizes, timeouts
//! - `trusted_proxy`: proxy-header trust for real-IP extraction
//! - `users`: portal account credentials and service scoping
//! - `services`: protected backends and their transport/port config
//! - `root`: the aggregate `Config` plus CLI/env overrides
//! - `errors`: configuration-specific error type

pub mod errors;
pub mod network;
pub mod proxy;
pub mod root;
pub mod services;
pub mod session;
pub mod trusted_proxy;
pub mod users;

pub use errors::ConfigError;
pub use network::NetworkAccessControlConfig;
pub use proxy::ProxyServerConfig;
pub use root::{CliOverrides, Config};
pub use services::{HttpServiceConfig, ProtectedServiceConfig};
pub use session::SessionConfig;
pub use trusted_proxy::TrustedProxyConfig;
pub use users::PortalUserAccount;
