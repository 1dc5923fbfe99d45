use serde::{Deserialize, Serialize};

/// Which L4 transports a protected service accepts. `Both` is expanded by
/// the forwarder manager into two independent forwarders sharing one
/// logical service id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Tcp,
    Udp,
    Both,
}

impl Transport {
    pub fn includes_tcp(self) -> bool {
        matches!(self, Transport::Tcp | Transport::Both)
    }

    pub fn includes_udp(self) -> bool {
        matches!(self, Transport::Udp | Transport::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Transport::Tcp => "tcp",
            Transport::Udp => "udp",
            Transport::Both => "both",
        }
    }
}
