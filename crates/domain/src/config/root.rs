use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use super::network::NetworkAccessControlConfig;
use super::proxy::ProxyServerConfig;
use super::services::ProtectedServiceConfig;
use super::session::SessionConfig;
use super::trusted_proxy::TrustedProxyConfig;
use super::users::PortalUserAccount;
use crate::service::find_port_conflict;

/// CLI/environment overrides applied on top of the parsed YAML document.
/// Mirrors the environment variables named in the external-interfaces
/// section: `HTTP_SERVER_PORT`, `TRUSTED_PROXY_ENABLED`,
/// `TRUSTED_PROXY_IP_RANGES`.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub admin_api_port: Option<u16>,
    pub trusted_proxy_enabled: Option<bool>,
    pub trusted_proxy_ip_ranges: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub session_config: SessionConfig,

    #[serde(default)]
    pub network_access_control: NetworkAccessControlConfig,

    #[serde(default)]
    pub proxy_server_config: ProxyServerConfig,

    #[serde(default)]
    pub trusted_proxy_config: TrustedProxyConfig,

    #[serde(default)]
    pub portal_user_accounts: Vec<PortalUserAccount>,

    #[serde(default)]
    pub protected_services: Vec<ProtectedServiceConfig>,
}

impl Config {
    /// Applies CLI/environment overrides on top of a parsed document. Pure;
    /// does not touch the filesystem or environment itself — the caller
    /// (`infrastructure::config::YamlConfigSource`) reads `std::env` and
    /// passes the result in.
    pub fn apply_overrides(mut self, overrides: CliOverrides) -> Self {
        if let Some(port) = overrides.admin_api_port {
            self.proxy_server_config.admin_api_port = port;
        }
        if let Some(enabled) = overrides.trusted_proxy_enabled {
            self.trusted_proxy_config.enabled = enabled;
        }
        if let Some(ranges) = overrides.trusted_proxy_ip_ranges {
            self.trusted_proxy_config.trusted_proxy_ip_ranges = ranges;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.session_config
            .validate()
            .map_err(ConfigError::Invalid)?;
        self.network_access_control
            .validate()
            .map_err(ConfigError::Invalid)?;
        self.proxy_server_config
            .validate()
            .map_err(ConfigError::Invalid)?;
        self.trusted_proxy_config
            .validate()
            .map_err(ConfigError::Invalid)?;

        for user in &self.portal_user_accounts {
            user.validate().map_err(ConfigError::Invalid)?;
        }
        for svc in &self.protected_services {
            svc.validate().map_err(ConfigError::Invalid)?;
        }

        let enabled_services: Vec<crate::Service> = self
            .protected_services
            .iter()
            .filter(|s| s.enabled)
            .map(|s| crate::Service {
                service_id: s.service_id.as_str().into(),
                service_name: s.service_name.as_str().into(),
                proxy_listen_port: s.proxy_listen_port_start,
                backend_host: s.backend_target_host.as_str().into(),
                backend_port: s.backend_target_port,
                transport: s.transport_protocol,
                enabled: s.enabled,
            })
            .collect();
        if let Some((a, b)) = find_port_conflict(&enabled_services) {
            return Err(ConfigError::Invalid(format!(
                "protected_services {a} and {b} both listen on the same port"
            )));
        }

        Ok(())
    }
}
