use serde::{Deserialize, Serialize};

use crate::Transport;

/// Header injection/override/removal rules for an `is_http_protocol` service.
/// Parsed and validated; not wired to a running reverse proxy in this
/// expansion (see DESIGN.md "HTTP reverse-proxy services").
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HttpServiceConfig {
    #[serde(default)]
    pub inject_headers: std::collections::BTreeMap<String, String>,

    #[serde(default)]
    pub override_headers: std::collections::BTreeMap<String, String>,

    #[serde(default)]
    pub remove_headers: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProtectedServiceConfig {
    pub service_id: String,
    pub service_name: String,

    pub proxy_listen_port_start: u16,

    #[serde(default)]
    pub proxy_listen_port_end: Option<u16>,

    pub backend_target_host: String,
    pub backend_target_port: u16,

    pub transport_protocol: Transport,

    #[serde(default)]
    pub is_http_protocol: bool,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub http_config: Option<HttpServiceConfig>,
}

fn default_true() -> bool {
    true
}

impl ProtectedServiceConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.service_id.trim().is_empty() {
            return Err("protected_services: service_id must not be empty".into());
        }
        if self.proxy_listen_port_start == 0 {
            return Err(format!(
                "protected_services[{}]: proxy_listen_port_start must be in 1..=65535",
                self.service_id
            ));
        }
        if let Some(end) = self.proxy_listen_port_end {
            if end < self.proxy_listen_port_start {
                return Err(format!(
                    "protected_services[{}]: proxy_listen_port_end must be >= proxy_listen_port_start",
                    self.service_id
                ));
            }
        }
        if self.backend_target_port == 0 {
            return Err(format!(
                "protected_services[{}]: backend_target_port must be in 1..=65535",
                self.service_id
            ));
        }
        if self.backend_target_host.trim().is_empty() {
            return Err(format!(
                "protected_services[{}]: backend_target_host must not be empty",
                self.service_id
            ));
        }
        Ok(())
    }
}
