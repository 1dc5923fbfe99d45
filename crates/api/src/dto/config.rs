use knockgate_domain::config::{
    Config, NetworkAccessControlConfig, PortalUserAccount, ProtectedServiceConfig,
    ProxyServerConfig, SessionConfig, TrustedProxyConfig,
};
use serde::Serialize;

/// `PortalUserAccount` without `bcrypt_hashed_password` — the one field in
/// the whole config tree that must never leave the process (§7: "secrets
/// redacted").
#[derive(Debug, Serialize)]
pub struct PortalUserAccountView {
    pub user_id: String,
    pub username: String,
    pub allowed_service_ids: Vec<String>,
    pub display_username_in_public_login_suggestions: bool,
    pub notes: Option<String>,
}

impl From<&PortalUserAccount> for PortalUserAccountView {
    fn from(u: &PortalUserAccount) -> Self {
        Self {
            user_id: u.user_id.clone(),
            username: u.username.clone(),
            allowed_service_ids: u.allowed_service_ids.clone(),
            display_username_in_public_login_suggestions: u
                .display_username_in_public_login_suggestions,
            notes: u.notes.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigSnapshotView {
    pub generation: u64,
    pub session_config: SessionConfig,
    pub network_access_control: NetworkAccessControlConfig,
    pub proxy_server_config: ProxyServerConfig,
    pub trusted_proxy_config: TrustedProxyConfig,
    pub portal_user_accounts: Vec<PortalUserAccountView>,
    pub protected_services: Vec<ProtectedServiceConfig>,
}

impl ConfigSnapshotView {
    pub fn new(generation: u64, config: &Config) -> Self {
        Self {
            generation,
            session_config: config.session_config.clone(),
            network_access_control: config.network_access_control.clone(),
            proxy_server_config: config.proxy_server_config.clone(),
            trusted_proxy_config: config.trusted_proxy_config.clone(),
            portal_user_accounts: config
                .portal_user_accounts
                .iter()
                .map(PortalUserAccountView::from)
                .collect(),
            protected_services: config.protected_services.clone(),
        }
    }
}
