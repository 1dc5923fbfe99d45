pub mod access;
pub mod auth;
pub mod config;
pub mod connections;
pub mod health;
pub mod sessions;

pub use access::get_access;
pub use auth::{login, logout};
pub use config::{get_config, reload_config};
pub use health::health_check;
