use std::sync::Arc;

use tracing::info;

use crate::{DnsRefreshJob, RateLimiterGcJob, SessionCleanupJob};

/// Central orchestrator for all background jobs. Builder pattern: register
/// whichever jobs this process needs, then call `.start()` once.
pub struct JobRunner {
    session_cleanup: Option<SessionCleanupJob>,
    dns_refresh: Option<DnsRefreshJob>,
    rate_limiter_gc: Option<RateLimiterGcJob>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self {
            session_cleanup: None,
            dns_refresh: None,
            rate_limiter_gc: None,
        }
    }

    pub fn with_session_cleanup(mut self, job: SessionCleanupJob) -> Self {
        self.session_cleanup = Some(job);
        self
    }

    pub fn with_dns_refresh(mut self, job: DnsRefreshJob) -> Self {
        self.dns_refresh = Some(job);
        self
    }

    pub fn with_rate_limiter_gc(mut self, job: RateLimiterGcJob) -> Self {
        self.rate_limiter_gc = Some(job);
        self
    }

    pub async fn start(self) {
        info!("starting background job runner");

        if let Some(job) = self.session_cleanup {
            Arc::new(job).start().await;
        }
        if let Some(job) = self.dns_refresh {
            Arc::new(job).start().await;
        }
        if let Some(job) = self.rate_limiter_gc {
            Arc::new(job).start().await;
        }

        info!("all background jobs started");
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}
