use std::sync::Arc;
use std::time::Duration;

use knockgate_application::ports::{ConfigSnapshot, FlowRevoker};
use knockgate_application::services::{
    AccessDecisionFacade, AccessRevocationCoordinator, AllowlistService, BlocklistService,
    CircuitBreakerRegistry, RateLimiterService, RealIpExtractor, SessionStore,
};
use knockgate_infrastructure::config::YamlConfigSource;
use knockgate_infrastructure::dns::HickoryDnsLookup;
use knockgate_infrastructure::forwarders::{BufferPool, ForwarderManager};

/// Login attempts are rate limited independently of the per-service
/// forwarder traffic; 30 req/min with a burst of 5 is generous for a human
/// typing a password and stingy against a credential-stuffing script.
const LOGIN_REQUESTS_PER_MINUTE: u32 = 30;
const LOGIN_BURST: u32 = 5;

const BUFFER_POOL_SLOTS_PER_SERVICE: usize = 64;

/// Every long-lived component the gateway process needs, wired once at
/// startup from the first config snapshot. Reload-sensitive pieces
/// (blocklist, allowlist, forwarders) are updated in place by the reload
/// watcher in `server`; components built here are never rebuilt.
pub struct Container {
    pub sessions: Arc<SessionStore>,
    pub blocklist: Arc<BlocklistService>,
    pub allowlist: Arc<AllowlistService>,
    pub rate_limiter: Arc<RateLimiterService>,
    pub real_ip: Arc<RealIpExtractor>,
    pub access_facade: Arc<AccessDecisionFacade>,
    pub revocation: Arc<AccessRevocationCoordinator>,
    pub forwarders: Arc<ForwarderManager>,
    pub dns: Arc<HickoryDnsLookup>,
    pub config_source: Arc<YamlConfigSource>,
}

impl Container {
    pub fn build(
        config_source: Arc<YamlConfigSource>,
        snapshot: &ConfigSnapshot,
    ) -> anyhow::Result<Self> {
        let config = &snapshot.config;
        ForwarderManager::validate(&config.protected_services).map_err(|e| anyhow::anyhow!(e))?;

        let blocklist = Arc::new(BlocklistService::from_config(&config.network_access_control));
        let allowlist = Arc::new(AllowlistService::from_config(&config.network_access_control));
        let sessions = Arc::new(SessionStore::new(
            config.session_config.max_concurrent_sessions,
            Duration::from_secs(config.session_config.default_session_duration_seconds),
        ));
        let rate_limiter = Arc::new(RateLimiterService::new(LOGIN_REQUESTS_PER_MINUTE, LOGIN_BURST));
        let real_ip = Arc::new(RealIpExtractor::from_config(&config.trusted_proxy_config));
        let access_facade = Arc::new(AccessDecisionFacade::new(blocklist.clone(), allowlist.clone()));

        let circuit_breakers = Arc::new(CircuitBreakerRegistry::default());
        let buffer_pool = Arc::new(BufferPool::new(
            config
                .proxy_server_config
                .tcp_buffer_size_bytes
                .max(config.proxy_server_config.udp_buffer_size_bytes),
            BUFFER_POOL_SLOTS_PER_SERVICE,
        ));

        let forwarders = Arc::new(ForwarderManager::new(
            blocklist.clone(),
            allowlist.clone(),
            sessions.clone(),
            circuit_breakers,
            buffer_pool,
            config.proxy_server_config.max_connections_per_service,
            Duration::from_secs(config.proxy_server_config.udp_session_timeout_seconds),
        ));

        let flow_revoker: Arc<dyn FlowRevoker> = forwarders.clone();
        let revocation = Arc::new(AccessRevocationCoordinator::new(
            sessions.clone(),
            allowlist.clone(),
            flow_revoker,
        ));

        Ok(Self {
            sessions,
            blocklist,
            allowlist,
            rate_limiter,
            real_ip,
            access_facade,
            revocation,
            forwarders,
            dns: Arc::new(HickoryDnsLookup::new()),
            config_source,
        })
    }
}
