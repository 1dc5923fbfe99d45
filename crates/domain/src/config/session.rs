use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_duration")]
    pub default_session_duration_seconds: u64,

    #[serde(default = "default_true")]
    pub auto_extend_session_on_connection: bool,

    #[serde(default)]
    pub maximum_session_duration_seconds: Option<u64>,

    #[serde(default = "default_cleanup_interval")]
    pub session_cleanup_interval_seconds: u64,

    /// 0 = unlimited.
    #[serde(default)]
    pub max_concurrent_sessions: u64,
}

fn default_session_duration() -> u64 {
    3600
}

fn default_cleanup_interval() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_session_duration_seconds: default_session_duration(),
            auto_extend_session_on_connection: true,
            maximum_session_duration_seconds: None,
            session_cleanup_interval_seconds: default_cleanup_interval(),
            max_concurrent_sessions: 0,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.default_session_duration_seconds < 1 {
            return Err("session_config.default_session_duration_seconds must be >= 1".into());
        }
        if self.session_cleanup_interval_seconds < 1 {
            return Err("session_config.session_cleanup_interval_seconds must be >= 1".into());
        }
        if let Some(max) = self.maximum_session_duration_seconds {
            if max < self.default_session_duration_seconds {
                return Err(
                    "session_config.maximum_session_duration_seconds must be >= default_session_duration_seconds"
                        .into(),
                );
            }
        }
        Ok(())
    }
}
