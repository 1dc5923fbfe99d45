use chrono::{DateTime, Utc};

/// Thresholds that govern how a client's bucket is slowed down after
/// repeated authentication failures. Mirrors the fixed steps named in the
/// spec rather than a configurable curve.
const SLOWDOWN_AT_3_FAILURES: (f64, u32) = (0.1, 2);
const SLOWDOWN_AT_5_FAILURES: (f64, u32) = (0.01, 1);

/// A per-IP token bucket plus the bookkeeping needed to slow it down after
/// repeated failures and garbage-collect it after 15 minutes idle.
#[derive(Debug, Clone)]
pub struct RateLimiterEntry {
    pub tokens: f64,
    pub refill_rate_per_sec: f64,
    pub burst: u32,
    pub fail_count: u32,
    pub last_accessed: DateTime<Utc>,
    base_refill_rate_per_sec: f64,
    base_burst: u32,
}

impl RateLimiterEntry {
    pub fn new(requests_per_minute: u32, burst: u32) -> Self {
        let now = Utc::now();
        let refill_rate_per_sec = requests_per_minute as f64 / 60.0;
        Self {
            tokens: burst as f64,
            refill_rate_per_sec,
            burst,
            fail_count: 0,
            last_accessed: now,
            base_refill_rate_per_sec: refill_rate_per_sec,
            base_burst: burst,
        }
    }

    fn refill(&mut self, now: DateTime<Utc>) {
        let elapsed = (now - self.last_accessed).num_milliseconds().max(0) as f64 / 1000.0;
        self.tokens = (self.tokens + elapsed * self.refill_rate_per_sec).min(self.burst as f64);
        self.last_accessed = now;
    }

    /// Consumes one token if available. Returns whether the request is allowed.
    pub fn try_consume(&mut self) -> bool {
        let now = Utc::now();
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Bumps the failure counter and, past the named thresholds, clamps this
    /// bucket's rate/burst down to the slower profile. Never speeds back up
    /// on its own — only `record_success` resets it.
    pub fn record_failure(&mut self) {
        self.fail_count += 1;
        if self.fail_count >= 5 {
            let (rate, burst) = SLOWDOWN_AT_5_FAILURES;
            self.refill_rate_per_sec = rate;
            self.burst = burst;
        } else if self.fail_count >= 3 {
            let (rate, burst) = SLOWDOWN_AT_3_FAILURES;
            self.refill_rate_per_sec = rate;
            self.burst = burst;
        }
        self.tokens = self.tokens.min(self.burst as f64);
    }

    /// Resets the failure counter and restores the bucket to its configured
    /// base rate/burst, undoing any slowdown `record_failure` applied.
    pub fn record_success(&mut self) {
        self.fail_count = 0;
        self.refill_rate_per_sec = self.base_refill_rate_per_sec;
        self.burst = self.base_burst;
    }

    pub fn idle_for(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.last_accessed
    }

    pub fn is_idle_past(&self, now: DateTime<Utc>, threshold: chrono::Duration) -> bool {
        self.idle_for(now) >= threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumes_tokens_up_to_burst() {
        let mut e = RateLimiterEntry::new(60, 3);
        assert!(e.try_consume());
        assert!(e.try_consume());
        assert!(e.try_consume());
        assert!(!e.try_consume());
    }

    #[test]
    fn failures_slow_the_bucket_down() {
        let mut e = RateLimiterEntry::new(600, 10);
        for _ in 0..5 {
            e.record_failure();
        }
        assert_eq!(e.burst, 1);
        assert!((e.refill_rate_per_sec - 0.01).abs() < f64::EPSILON);
    }

    #[test]
    fn success_restores_the_base_rate_and_burst() {
        let mut e = RateLimiterEntry::new(600, 10);
        e.record_failure();
        e.record_failure();
        e.record_failure();
        e.record_failure();
        e.record_failure();
        assert_eq!(e.burst, 1);
        e.record_success();
        assert_eq!(e.fail_count, 0);
        assert_eq!(e.burst, 10);
        assert!((e.refill_rate_per_sec - 10.0).abs() < f64::EPSILON);
    }
}
