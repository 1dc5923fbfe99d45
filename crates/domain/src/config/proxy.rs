use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyServerConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    #[serde(default = "default_admin_api_port")]
    pub admin_api_port: u16,

    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,

    #[serde(default = "default_max_connections")]
    pub max_connections_per_service: u32,

    #[serde(default = "default_tcp_buffer_size")]
    pub tcp_buffer_size_bytes: usize,

    #[serde(default = "default_udp_buffer_size")]
    pub udp_buffer_size_bytes: usize,

    #[serde(default = "default_udp_session_timeout")]
    pub udp_session_timeout_seconds: u64,
}

fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}
fn default_admin_api_port() -> u16 {
    8443
}
fn default_connection_timeout() -> u64 {
    10
}
fn default_max_connections() -> u32 {
    1024
}
fn default_tcp_buffer_size() -> usize {
    32 * 1024
}
fn default_udp_buffer_size() -> usize {
    64 * 1024
}
fn default_udp_session_timeout() -> u64 {
    60
}

impl Default for ProxyServerConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            admin_api_port: default_admin_api_port(),
            connection_timeout_seconds: default_connection_timeout(),
            max_connections_per_service: default_max_connections(),
            tcp_buffer_size_bytes: default_tcp_buffer_size(),
            udp_buffer_size_bytes: default_udp_buffer_size(),
            udp_session_timeout_seconds: default_udp_session_timeout(),
        }
    }
}

impl ProxyServerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.connection_timeout_seconds < 1 {
            return Err("proxy_server_config.connection_timeout_seconds must be >= 1".into());
        }
        if self.tcp_buffer_size_bytes == 0 || self.udp_buffer_size_bytes == 0 {
            return Err("proxy_server_config buffer sizes must be > 0".into());
        }
        Ok(())
    }
}
