use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrustedProxyConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub trusted_proxy_ip_ranges: Vec<String>,

    #[serde(default = "default_header_priority")]
    pub client_ip_header_priority: Vec<String>,
}

fn default_header_priority() -> Vec<String> {
    vec![
        "CF-Connecting-IP".to_string(),
        "X-Real-IP".to_string(),
        "X-Forwarded-For".to_string(),
    ]
}

impl Default for TrustedProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            trusted_proxy_ip_ranges: vec![],
            client_ip_header_priority: default_header_priority(),
        }
    }
}

impl TrustedProxyConfig {
    pub fn validate(&self) -> Result<(), String> {
        for entry in &self.trusted_proxy_ip_ranges {
            crate::ip_matcher::IpEntry::parse(entry)
                .map_err(|e| format!("trusted_proxy_config: {e}"))?;
        }
        Ok(())
    }
}
