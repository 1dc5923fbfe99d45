use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PortalUserAccount {
    pub user_id: String,
    pub username: String,
    pub bcrypt_hashed_password: String,

    #[serde(default)]
    pub allowed_service_ids: Vec<String>,

    #[serde(default)]
    pub display_username_in_public_login_suggestions: bool,

    #[serde(default)]
    pub notes: Option<String>,
}

impl PortalUserAccount {
    pub fn validate(&self) -> Result<(), String> {
        if self.user_id.trim().is_empty() {
            return Err("portal_user_accounts: user_id must not be empty".into());
        }
        if self.username.trim().is_empty() {
            return Err(format!(
                "portal_user_accounts[{}]: username must not be empty",
                self.user_id
            ));
        }
        let valid_prefix = ["$2a$", "$2b$", "$2y$"]
            .iter()
            .any(|p| self.bcrypt_hashed_password.starts_with(p));
        if !valid_prefix {
            return Err(format!(
                "portal_user_accounts[{}]: bcrypt_hashed_password must start with $2a$, $2b$, or $2y$",
                self.user_id
            ));
        }
        Ok(())
    }

    pub fn is_admin(&self) -> bool {
        self.allowed_service_ids.is_empty()
            && self
                .notes
                .as_deref()
                .map(|n| n.split(',').any(|tag| tag.trim() == "admin"))
                .unwrap_or(false)
    }
}
