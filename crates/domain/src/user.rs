use std::sync::Arc;

use crate::ServiceId;

pub type UserId = Arc<str>;

/// A portal account. The credential store (where `password_hash` actually
/// lives and is checked) is external — this is just the shape the core
/// reasons about once a login has already verified the password.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    pub username: Arc<str>,
    pub password_hash: Arc<str>,
    /// Empty means "all services".
    pub allowed_service_ids: Vec<ServiceId>,
    pub display_in_public_suggestions: bool,
    /// Free-text notes field. By convention (see DESIGN.md) a user whose
    /// `notes` contains the literal tag `admin` and whose
    /// `allowed_service_ids` is empty may manage other users' sessions.
    pub notes: Option<Arc<str>>,
}

impl User {
    pub fn is_allowed_service(&self, service_id: &str) -> bool {
        self.allowed_service_ids.is_empty()
            || self
                .allowed_service_ids
                .iter()
                .any(|id| id.as_ref() == service_id)
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
