//! Concrete adapters for the knockgate application ports: bcrypt password
//! verification, HMAC session tokens, YAML config loading with file-watch
//! hot-reload, hickory-based DNS resolution, and the TCP/UDP forwarders
//! that actually move bytes between clients and protected backends.

pub mod auth;
pub mod config;
pub mod dns;
pub mod forwarders;
