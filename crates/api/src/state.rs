use std::sync::Arc;

use knockgate_application::ports::{ConfigSource, CredentialVerifier, SessionTokenIssuer};
use knockgate_application::services::{
    AccessDecisionFacade, AccessRevocationCoordinator, AllowlistService, BlocklistService,
    RateLimiterService, RealIpExtractor, SessionStore,
};
use knockgate_infrastructure::forwarders::ForwarderManager;

/// Everything an admin API handler needs, shared across every connection.
/// Cloning is cheap — every field is an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub blocklist: Arc<BlocklistService>,
    pub allowlist: Arc<AllowlistService>,
    pub rate_limiter: Arc<RateLimiterService>,
    pub real_ip: Arc<RealIpExtractor>,
    pub access_facade: Arc<AccessDecisionFacade>,
    pub revocation: Arc<AccessRevocationCoordinator>,
    pub credential_verifier: Arc<dyn CredentialVerifier>,
    pub token_issuer: Arc<dyn SessionTokenIssuer>,
    pub config_source: Arc<dyn ConfigSource>,
    pub forwarders: Arc<ForwarderManager>,
}
