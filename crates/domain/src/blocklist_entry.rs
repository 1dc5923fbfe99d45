use std::net::IpAddr;

use ipnetwork::IpNetwork;

/// A permanent deny entry. No expiry, no metadata beyond the address or
/// prefix itself — the blocklist check is a pure membership test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlocklistEntry {
    Exact(IpAddr),
    Cidr(IpNetwork),
}

impl BlocklistEntry {
    pub fn matches(&self, addr: IpAddr) -> bool {
        match self {
            BlocklistEntry::Exact(exact) => *exact == addr,
            BlocklistEntry::Cidr(net) => net.contains(addr),
        }
    }
}
