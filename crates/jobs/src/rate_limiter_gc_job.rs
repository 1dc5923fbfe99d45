use std::sync::Arc;
use std::time::Duration;

use knockgate_application::services::RateLimiterService;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Periodically drops rate-limiter buckets that have sat idle past the
/// service's own idle threshold, bounding the bucket map's growth.
pub struct RateLimiterGcJob {
    rate_limiter: Arc<RateLimiterService>,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl RateLimiterGcJob {
    pub fn new(rate_limiter: Arc<RateLimiterService>) -> Self {
        Self {
            rate_limiter,
            interval_secs: DEFAULT_INTERVAL_SECS,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn start(self: Arc<Self>) {
        info!(interval_secs = self.interval_secs, "starting rate limiter gc job");

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("rate limiter gc job shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let removed = self.rate_limiter.gc_idle();
                        if removed == 0 {
                            debug!("rate limiter gc: nothing idle");
                        } else {
                            info!(removed, "rate limiter gc dropped idle buckets");
                        }
                    }
                }
            }
        });
    }
}
