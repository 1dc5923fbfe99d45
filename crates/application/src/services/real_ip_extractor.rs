use std::net::IpAddr;

use ipnetwork::IpNetwork;
use knockgate_domain::TrustedProxyConfig;

/// Resolves the effective client IP from a TCP peer address plus forwarding
/// headers (C11). Disabled trust mode always returns the peer.
pub struct RealIpExtractor {
    enabled: bool,
    trusted_ranges: Vec<IpNetwork>,
    header_priority: Vec<String>,
}

impl RealIpExtractor {
    pub fn from_config(cfg: &TrustedProxyConfig) -> Self {
        let trusted_ranges = cfg
            .trusted_proxy_ip_ranges
            .iter()
            .filter_map(|s| {
                knockgate_domain::IpEntry::parse(s).ok().and_then(|e| match e {
                    knockgate_domain::IpEntry::Cidr(net) => Some(net),
                    knockgate_domain::IpEntry::Exact(addr) => IpNetwork::new(
                        addr,
                        if addr.is_ipv4() { 32 } else { 128 },
                    )
                    .ok(),
                })
            })
            .collect();
        Self {
            enabled: cfg.enabled,
            trusted_ranges,
            header_priority: cfg.client_ip_header_priority.clone(),
        }
    }

    fn is_trusted_peer(&self, peer: IpAddr) -> bool {
        self.trusted_ranges.iter().any(|net| net.contains(peer))
    }

    /// `headers` is an iterator of `(name, value)` pairs as received; header
    /// name comparison is case-insensitive.
    pub fn extract<'a>(
        &self,
        peer: IpAddr,
        headers: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> IpAddr {
        if !self.enabled {
            return peer;
        }

        let headers: Vec<(&str, &str)> = headers.into_iter().collect();

        if !self.is_trusted_peer(peer) {
            if headers.iter().any(|(name, _)| self.header_priority.iter().any(|h| h.eq_ignore_ascii_case(name))) {
                tracing::warn!(%peer, "forwarding header present from untrusted peer, ignoring");
            }
            return peer;
        }

        for wanted in &self.header_priority {
            if let Some((_, value)) = headers.iter().find(|(name, _)| wanted.eq_ignore_ascii_case(name)) {
                let candidate = value.split(',').next().unwrap_or(value).trim();
                if let Ok(addr) = candidate.parse::<IpAddr>() {
                    return addr;
                }
            }
        }

        peer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(enabled: bool) -> TrustedProxyConfig {
        TrustedProxyConfig {
            enabled,
            trusted_proxy_ip_ranges: vec!["10.0.0.0/8".into()],
            client_ip_header_priority: vec!["X-Forwarded-For".into()],
        }
    }

    #[test]
    fn disabled_mode_returns_peer() {
        let extractor = RealIpExtractor::from_config(&cfg(false));
        let peer: IpAddr = "203.0.113.9".parse().unwrap();
        assert_eq!(
            extractor.extract(peer, [("X-Forwarded-For", "198.51.100.1")]),
            peer
        );
    }

    #[test]
    fn untrusted_peer_is_not_overridden() {
        let extractor = RealIpExtractor::from_config(&cfg(true));
        let peer: IpAddr = "203.0.113.9".parse().unwrap();
        assert_eq!(
            extractor.extract(peer, [("X-Forwarded-For", "198.51.100.1")]),
            peer
        );
    }

    #[test]
    fn trusted_peer_header_is_honored_first_token() {
        let extractor = RealIpExtractor::from_config(&cfg(true));
        let peer: IpAddr = "10.0.0.1".parse().unwrap();
        assert_eq!(
            extractor.extract(peer, [("X-Forwarded-For", "198.51.100.1, 10.0.0.1")]),
            "198.51.100.1".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn falls_back_to_peer_when_header_unparseable() {
        let extractor = RealIpExtractor::from_config(&cfg(true));
        let peer: IpAddr = "10.0.0.1".parse().unwrap();
        assert_eq!(extractor.extract(peer, [("X-Forwarded-For", "garbage")]), peer);
    }
}
