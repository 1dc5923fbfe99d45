use std::net::IpAddr;

use chrono::Utc;
use dashmap::DashMap;
use knockgate_domain::RateLimiterEntry;

const GC_IDLE_THRESHOLD_MINUTES: i64 = 15;

/// Per-client-IP token bucket with failure-driven slowdown (C6).
pub struct RateLimiterService {
    buckets: DashMap<IpAddr, RateLimiterEntry>,
    requests_per_minute: u32,
    burst: u32,
}

impl RateLimiterService {
    pub fn new(requests_per_minute: u32, burst: u32) -> Self {
        Self {
            buckets: DashMap::new(),
            requests_per_minute,
            burst,
        }
    }

    pub fn allow(&self, addr: IpAddr) -> bool {
        self.buckets
            .entry(addr)
            .or_insert_with(|| RateLimiterEntry::new(self.requests_per_minute, self.burst))
            .try_consume()
    }

    pub fn record_failure(&self, addr: IpAddr) {
        self.buckets
            .entry(addr)
            .or_insert_with(|| RateLimiterEntry::new(self.requests_per_minute, self.burst))
            .record_failure();
    }

    pub fn record_success(&self, addr: IpAddr) {
        if let Some(mut entry) = self.buckets.get_mut(&addr) {
            entry.record_success();
        }
    }

    /// Drops buckets idle for more than 15 minutes. Intended to be called
    /// by `jobs::RateLimiterGcJob` on a periodic sweep.
    pub fn gc_idle(&self) -> usize {
        let now = Utc::now();
        let threshold = chrono::Duration::minutes(GC_IDLE_THRESHOLD_MINUTES);
        let stale: Vec<IpAddr> = self
            .buckets
            .iter()
            .filter(|e| e.value().is_idle_past(now, threshold))
            .map(|e| *e.key())
            .collect();
        for addr in &stale {
            self.buckets.remove(addr);
        }
        stale.len()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_burst_then_denies() {
        let svc = RateLimiterService::new(60, 2);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        assert!(svc.allow(ip));
        assert!(svc.allow(ip));
        assert!(!svc.allow(ip));
    }

    #[test]
    fn gc_drops_nothing_when_fresh() {
        let svc = RateLimiterService::new(60, 2);
        svc.allow("10.0.0.1".parse().unwrap());
        assert_eq!(svc.gc_idle(), 0);
    }
}
