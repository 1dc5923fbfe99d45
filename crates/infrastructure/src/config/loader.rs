use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use knockgate_application::ports::{ConfigSnapshot, ConfigSource};
use knockgate_domain::{CliOverrides, Config, DomainError};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Reads `TRUSTED_PROXY_IP_RANGES` (comma-separated), `TRUSTED_PROXY_ENABLED`
/// and `HTTP_SERVER_PORT` the way `bootstrap::config` wires CLI overrides on
/// top of the parsed document.
fn env_overrides() -> CliOverrides {
    CliOverrides {
        admin_api_port: std::env::var("HTTP_SERVER_PORT")
            .ok()
            .and_then(|v| v.parse().ok()),
        trusted_proxy_enabled: std::env::var("TRUSTED_PROXY_ENABLED")
            .ok()
            .and_then(|v| v.parse().ok()),
        trusted_proxy_ip_ranges: std::env::var("TRUSTED_PROXY_IP_RANGES")
            .ok()
            .map(|v| v.split(',').map(|s| s.trim().to_owned()).collect()),
    }
}

fn load_from_disk(path: &Path) -> Result<Config, DomainError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| DomainError::Internal(format!("reading {}: {e}", path.display())))?;
    let config: Config = serde_yaml::from_str(&raw)
        .map_err(|e| DomainError::Validation(format!("parsing {}: {e}", path.display())))?;
    let config = config.apply_overrides(env_overrides());
    config
        .validate()
        .map_err(|e| DomainError::Validation(e.to_string()))?;
    Ok(config)
}

/// Loads `Config` from a YAML file, watches it with `notify`, and publishes
/// a new `ConfigSnapshot` on every reload that actually changes anything
/// (C15). A failed reload is logged and the previous snapshot stands —
/// subscribers never observe a half-applied or invalid configuration.
pub struct YamlConfigSource {
    path: PathBuf,
    generation: AtomicU64,
    sender: watch::Sender<Arc<ConfigSnapshot>>,
    receiver: watch::Receiver<Arc<ConfigSnapshot>>,
}

impl YamlConfigSource {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();
        let config = load_from_disk(&path)?;
        let snapshot = Arc::new(ConfigSnapshot {
            config: Arc::new(config),
            generation: 0,
        });
        let (sender, receiver) = watch::channel(snapshot);
        Ok(Self {
            path,
            generation: AtomicU64::new(0),
            sender,
            receiver,
        })
    }

    /// Spawns the file watcher. Reloads are debounced by `notify`'s own
    /// event coalescing; each raw event still re-reads and re-validates the
    /// whole file, so a reload during a partial write simply fails and is
    /// retried on the next event.
    pub fn watch(self: &Arc<Self>, shutdown: CancellationToken) -> Result<(), DomainError> {
        let (tx, mut rx) = mpsc::channel(16);
        let mut watcher: RecommendedWatcher = notify::recommended_watcher(move |res| {
            if res.is_ok() {
                let _ = tx.blocking_send(());
            }
        })
        .map_err(|e| DomainError::Internal(format!("creating file watcher: {e}")))?;

        watcher
            .watch(&self.path, RecursiveMode::NonRecursive)
            .map_err(|e| DomainError::Internal(format!("watching {}: {e}", self.path.display())))?;

        let this = self.clone();
        tokio::spawn(async move {
            // Keep the watcher alive for the lifetime of the task.
            let _watcher = watcher;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        info!("config watcher shutting down");
                        return;
                    }
                    event = rx.recv() => {
                        if event.is_none() {
                            return;
                        }
                        if let Err(e) = this.reload().await {
                            warn!(error = %e, "config reload failed, keeping previous snapshot");
                        }
                    }
                }
            }
        });
        Ok(())
    }
}

#[async_trait]
impl ConfigSource for YamlConfigSource {
    async fn current(&self) -> Arc<ConfigSnapshot> {
        self.receiver.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Arc<ConfigSnapshot>> {
        self.receiver.clone()
    }

    async fn reload(&self) -> Result<(), DomainError> {
        let path = self.path.clone();
        let config = tokio::task::spawn_blocking(move || load_from_disk(&path))
            .await
            .map_err(|e| DomainError::Internal(format!("config reload task panicked: {e}")))??;

        let previous = self.receiver.borrow().clone();
        let serialized_new = serde_yaml::to_string(&config).unwrap_or_default();
        let serialized_old = serde_yaml::to_string(previous.config.as_ref()).unwrap_or_default();
        if serialized_new == serialized_old {
            return Ok(());
        }

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let snapshot = Arc::new(ConfigSnapshot {
            config: Arc::new(config),
            generation,
        });
        self.sender.send(snapshot).map_err(|_| {
            DomainError::Internal("config snapshot channel has no receivers".into())
        })?;
        info!(generation, "configuration reloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_yaml(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("gateway.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[tokio::test]
    async fn loads_default_config_from_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_yaml(&dir, "{}\n");
        let source = YamlConfigSource::load(&path).unwrap();
        assert_eq!(source.current().await.generation, 0);
    }

    #[tokio::test]
    async fn reload_is_a_noop_when_content_is_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_yaml(&dir, "{}\n");
        let source = YamlConfigSource::load(&path).unwrap();
        source.reload().await.unwrap();
        assert_eq!(source.current().await.generation, 0);
    }

    #[tokio::test]
    async fn reload_bumps_generation_on_real_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_yaml(&dir, "{}\n");
        let source = YamlConfigSource::load(&path).unwrap();

        write_yaml(
            &dir,
            "session_config:\n  default_session_duration_seconds: 120\n",
        );
        source.reload().await.unwrap();
        assert_eq!(source.current().await.generation, 1);
        assert_eq!(
            source
                .current()
                .await
                .config
                .session_config
                .default_session_duration_seconds,
            120
        );
    }

    #[tokio::test]
    async fn reload_rejects_invalid_yaml_and_keeps_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_yaml(&dir, "{}\n");
        let source = YamlConfigSource::load(&path).unwrap();

        write_yaml(&dir, "session_config:\n  default_session_duration_seconds: 0\n");
        assert!(source.reload().await.is_err());
        assert_eq!(source.current().await.generation, 0);
    }
}

