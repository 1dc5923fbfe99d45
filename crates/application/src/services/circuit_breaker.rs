use std::sync::Arc;

use dashmap::DashMap;
use knockgate_domain::{CircuitBreaker, ServiceId};

const DEFAULT_MAX_FAILURES: u32 = 5;
const DEFAULT_TIMEOUT_SECS: i64 = 30;
const DEFAULT_HALF_OPEN_ATTEMPTS: u32 = 3;

/// Owns one `CircuitBreaker` per protected service (C7), created lazily on
/// first use so services added by a hot reload get a breaker automatically.
pub struct CircuitBreakerRegistry {
    breakers: DashMap<ServiceId, Arc<CircuitBreaker>>,
    max_failures: u32,
    timeout_secs: i64,
    half_open_attempts: u32,
}

impl CircuitBreakerRegistry {
    pub fn new(max_failures: u32, timeout_secs: i64, half_open_attempts: u32) -> Self {
        Self {
            breakers: DashMap::new(),
            max_failures,
            timeout_secs,
            half_open_attempts,
        }
    }

    pub fn get_or_create(&self, service_id: &ServiceId) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(service_id.clone())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(
                    self.max_failures,
                    self.timeout_secs,
                    self.half_open_attempts,
                ))
            })
            .clone()
    }

    pub fn allow(&self, service_id: &ServiceId) -> bool {
        self.get_or_create(service_id).allow()
    }

    pub fn record_success(&self, service_id: &ServiceId) {
        self.get_or_create(service_id).record_success();
    }

    pub fn record_failure(&self, service_id: &ServiceId) {
        self.get_or_create(service_id).record_failure();
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_FAILURES,
            DEFAULT_TIMEOUT_SECS,
            DEFAULT_HALF_OPEN_ATTEMPTS,
        )
    }
}
