use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NetworkAccessControlConfig {
    #[serde(default)]
    pub blocked_ip_addresses: Vec<String>,

    #[serde(default)]
    pub allowed_dynamic_dns_hostnames: Vec<String>,

    #[serde(default)]
    pub permanently_allowed_ip_ranges: Vec<String>,

    #[serde(default = "default_dns_refresh_interval")]
    pub dns_refresh_interval_seconds: u64,
}

fn default_dns_refresh_interval() -> u64 {
    300
}

impl NetworkAccessControlConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.dns_refresh_interval_seconds < 1 {
            return Err("network_access_control.dns_refresh_interval_seconds must be >= 1".into());
        }
        for entry in self
            .blocked_ip_addresses
            .iter()
            .chain(self.permanently_allowed_ip_ranges.iter())
        {
            crate::ip_matcher::IpEntry::parse(entry)
                .map_err(|e| format!("network_access_control: {e}"))?;
        }
        Ok(())
    }
}
