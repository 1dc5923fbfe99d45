//! Knockgate domain layer.
//!
//! Pure value types and invariants for the knock-knock gateway: services,
//! users, sessions, allow/block entries, access decisions, and the
//! validated configuration tree. Nothing in this crate touches a socket,
//! a clock source beyond `chrono::Utc::now`, or an external process.

pub mod access_decision;
pub mod allowlist_entry;
pub mod blocklist_entry;
pub mod circuit_breaker;
pub mod config;
pub mod errors;
pub mod ip_matcher;
pub mod rate_limiter;
pub mod service;
pub mod session;
pub mod transport;
pub mod user;
pub mod validators;

pub use access_decision::{AccessDecision, AccessReason};
pub use allowlist_entry::AllowlistEntry;
pub use blocklist_entry::BlocklistEntry;
pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use config::{CliOverrides, Config, ConfigError};
pub use errors::DomainError;
pub use ip_matcher::IpEntry;
pub use rate_limiter::RateLimiterEntry;
pub use service::{Service, ServiceId};
pub use session::{Session, SessionId};
pub use transport::Transport;
pub use user::{User, UserId};
