//! IP Matcher (C1): parsing and membership testing for bare addresses and
//! CIDR ranges, shared by the blocklist, the allowlist, and trusted-proxy
//! checks.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use ipnetwork::IpNetwork;

/// A single allow/block entry: either an exact address or a CIDR prefix.
/// CIDRs are normalized to their masked network address on construction so
/// two textually different but logically identical entries compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpEntry {
    Exact(IpAddr),
    Cidr(IpNetwork),
}

impl IpEntry {
    /// Parse `"a.b.c.d"`, `"a.b.c.d/n"`, or the IPv6 analogs. A bare address
    /// with no `/` is an exact entry; anything with a `/` is a CIDR, even a
    /// `/32` or `/128` (kept as `Cidr` rather than collapsed to `Exact` so
    /// the caller's intent — "this was configured as a range" — survives).
    pub fn parse(text: &str) -> Result<Self, IpEntryParseError> {
        let text = text.trim();
        if text.contains('/') {
            let net = IpNetwork::from_str(text)
                .map_err(|_| IpEntryParseError(text.to_string()))?;
            let masked = IpNetwork::new(net.network(), net.prefix())
                .expect("prefix taken from a previously-valid IpNetwork");
            Ok(IpEntry::Cidr(masked))
        } else {
            let addr = IpAddr::from_str(text).map_err(|_| IpEntryParseError(text.to_string()))?;
            Ok(IpEntry::Exact(addr))
        }
    }

    /// Exact equality when `self` carries no prefix, else prefix containment.
    pub fn matches(&self, addr: IpAddr) -> bool {
        match self {
            IpEntry::Exact(exact) => *exact == addr,
            IpEntry::Cidr(net) => net.contains(addr),
        }
    }
}

impl fmt::Display for IpEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpEntry::Exact(addr) => write!(f, "{addr}"),
            IpEntry::Cidr(net) => write!(f, "{net}"),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid IP address or CIDR: {0}")]
pub struct IpEntryParseError(pub String);

/// Helper used by blocklist/allowlist CIDR vectors: true if any entry in
/// `prefixes` contains `addr`.
pub fn any_contains<'a>(prefixes: impl IntoIterator<Item = &'a IpNetwork>, addr: IpAddr) -> bool {
    prefixes.into_iter().any(|net| net.contains(addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_v4() {
        let e = IpEntry::parse("192.0.2.10").unwrap();
        assert_eq!(e, IpEntry::Exact("192.0.2.10".parse().unwrap()));
    }

    #[test]
    fn parses_cidr_v4_and_normalizes() {
        let e = IpEntry::parse("198.51.100.7/24").unwrap();
        match e {
            IpEntry::Cidr(net) => assert_eq!(net.to_string(), "198.51.100.0/24"),
            _ => panic!("expected CIDR"),
        }
    }

    #[test]
    fn matches_exact_only_exact_address() {
        let e = IpEntry::parse("192.0.2.10").unwrap();
        assert!(e.matches("192.0.2.10".parse().unwrap()));
        assert!(!e.matches("192.0.2.11".parse().unwrap()));
    }

    #[test]
    fn matches_cidr_containment() {
        let e = IpEntry::parse("198.51.100.0/24").unwrap();
        assert!(e.matches("198.51.100.200".parse().unwrap()));
        assert!(!e.matches("198.51.101.1".parse().unwrap()));
    }

    #[test]
    fn rejects_garbage() {
        assert!(IpEntry::parse("not-an-ip").is_err());
        assert!(IpEntry::parse("10.0.0.1/99").is_err());
    }

    #[test]
    fn parses_ipv6() {
        let e = IpEntry::parse("2001:db8::/32").unwrap();
        assert!(e.matches("2001:db8::1".parse().unwrap()));
        assert!(!e.matches("2001:db9::1".parse().unwrap()));
    }
}
