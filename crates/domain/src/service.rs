use std::sync::Arc;

use crate::Transport;

pub type ServiceId = Arc<str>;

/// A protected backend reachable only through the gateway. Immutable within
/// a reload generation; `ForwarderManager` replaces the whole set atomically
/// on reload rather than mutating a `Service` in place.
#[derive(Debug, Clone)]
pub struct Service {
    pub service_id: ServiceId,
    pub service_name: Arc<str>,
    /// Canonical listen port. Config may express a start/end range; only the
    /// start port is opened (see DESIGN.md "port ranges").
    pub proxy_listen_port: u16,
    pub backend_host: Arc<str>,
    pub backend_port: u16,
    pub transport: Transport,
    pub enabled: bool,
}

impl Service {
    /// True if this service and `other` would conflict: both enabled and
    /// bound to the same listen port.
    pub fn conflicts_with(&self, other: &Service) -> bool {
        self.enabled
            && other.enabled
            && self.service_id != other.service_id
            && self.proxy_listen_port == other.proxy_listen_port
    }
}

/// Checked after config load/reload: no two enabled services may share a
/// listen port. Returns the offending pair's service ids.
pub fn find_port_conflict(services: &[Service]) -> Option<(ServiceId, ServiceId)> {
    for (i, a) in services.iter().enumerate() {
        for b in &services[i + 1..] {
            if a.conflicts_with(b) {
                return Some((a.service_id.clone(), b.service_id.clone()));
            }
        }
    }
    None
}
