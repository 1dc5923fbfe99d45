use std::sync::Arc;

use async_trait::async_trait;
use knockgate_domain::{Config, DomainError};
use tokio::sync::watch;

/// A versioned `Config` plus the generation counter the hot-reload
/// orchestrator uses to decide whether a reload actually changed anything
/// observable (see SPEC_FULL "Config snapshot").
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    pub config: Arc<Config>,
    pub generation: u64,
}

/// Application-layer port for configuration loading and hot-reload (C15).
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn current(&self) -> Arc<ConfigSnapshot>;

    /// A channel that publishes a new snapshot every time a reload produces
    /// a materially different configuration. Subscribers never see an
    /// errored reload — the previous snapshot is retained and the failure
    /// is only logged.
    fn subscribe(&self) -> watch::Receiver<Arc<ConfigSnapshot>>;

    /// Forces a reload from the source (file, in this expansion) outside
    /// the normal file-watch/SIGHUP cadence.
    async fn reload(&self) -> Result<(), DomainError>;
}
