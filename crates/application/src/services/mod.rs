//! In-memory, in-process engines: blocklist, allowlist, session store, rate
//! limiter, circuit breaker registry, real-IP extraction, the cross-source
//! access-decision facade, and the session-revocation coordinator.

pub mod access_decision_facade;
pub mod access_revocation_coordinator;
pub mod allowlist;
pub mod blocklist;
pub mod circuit_breaker;
pub mod rate_limiter;
pub mod real_ip_extractor;
pub mod session_store;

pub use access_decision_facade::{AccessDecisionFacade, ServiceAccess};
pub use access_revocation_coordinator::AccessRevocationCoordinator;
pub use allowlist::AllowlistService;
pub use blocklist::BlocklistService;
pub use circuit_breaker::CircuitBreakerRegistry;
pub use rate_limiter::RateLimiterService;
pub use real_ip_extractor::RealIpExtractor;
pub use session_store::SessionStore;
