use std::sync::Arc;
use std::time::Duration;

use knockgate_application::services::SessionStore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Periodically sweeps the session store for expired sessions and removes
/// them (C5's cleanup cadence, `session_cleanup_interval_seconds`).
pub struct SessionCleanupJob {
    sessions: Arc<SessionStore>,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl SessionCleanupJob {
    pub fn new(sessions: Arc<SessionStore>, interval_secs: u64) -> Self {
        Self {
            sessions,
            interval_secs,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn start(self: Arc<Self>) {
        info!(interval_secs = self.interval_secs, "starting session cleanup job");

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("session cleanup job shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let expired = self.sessions.sweep_expired().await;
                        if expired.is_empty() {
                            debug!("session cleanup: nothing expired");
                        } else {
                            info!(count = expired.len(), "session cleanup removed expired sessions");
                        }
                    }
                }
            }
        });
    }
}
