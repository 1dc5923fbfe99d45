use std::path::Path;
use std::sync::Arc;

use knockgate_infrastructure::config::YamlConfigSource;
use tracing::info;

/// Loads and validates the gateway's YAML configuration, returning the live
/// `YamlConfigSource` the rest of the process subscribes to for hot reload.
pub async fn load_config(path: &Path) -> anyhow::Result<Arc<YamlConfigSource>> {
    let source = Arc::new(YamlConfigSource::load(path).map_err(|e| anyhow::anyhow!(e))?);
    let snapshot = source.current().await;

    info!(
        config_path = %path.display(),
        services = snapshot.config.protected_services.len(),
        portal_users = snapshot.config.portal_user_accounts.len(),
        admin_api_port = snapshot.config.proxy_server_config.admin_api_port,
        "configuration loaded"
    );

    Ok(source)
}
