use std::net::IpAddr;

use knockgate_domain::ServiceId;
use knockgate_infrastructure::forwarders::ConnectionSummary;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ConnectionEntry {
    pub service_id: ServiceId,
    pub protocol: &'static str,
    pub client_ip: IpAddr,
    pub client_port: Option<u16>,
}

impl From<ConnectionSummary> for ConnectionEntry {
    fn from(c: ConnectionSummary) -> Self {
        Self {
            service_id: c.service_id,
            protocol: c.protocol,
            client_ip: c.client_ip,
            client_port: c.client_port,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TerminateConnectionsResponse {
    pub terminated: usize,
}
