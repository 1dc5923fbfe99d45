use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU8, Ordering};

use chrono::Utc;

const DEFAULT_MAX_FAILURES: u32 = 5;
const DEFAULT_TIMEOUT_SECS: i64 = 30;
const DEFAULT_HALF_OPEN_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl CircuitState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => CircuitState::Open,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Closed,
        }
    }
}

/// Per-service circuit breaker. Lock-free on the hot path: state, counters,
/// and timestamps are independent atomics, matching the teacher's
/// CAS-driven connection-state idiom rather than a mutex around a struct.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: AtomicU8,
    failure_count: AtomicU32,
    success_count: AtomicU32,
    last_failure_at_epoch_ms: AtomicI64,
    last_state_change_epoch_ms: AtomicI64,
    max_failures: u32,
    timeout_secs: i64,
    half_open_attempts: u32,
}

impl CircuitBreaker {
    pub fn new(max_failures: u32, timeout_secs: i64, half_open_attempts: u32) -> Self {
        let now = Utc::now().timestamp_millis();
        Self {
            state: AtomicU8::new(CircuitState::Closed as u8),
            failure_count: AtomicU32::new(0),
            success_count: AtomicU32::new(0),
            last_failure_at_epoch_ms: AtomicI64::new(0),
            last_state_change_epoch_ms: AtomicI64::new(now),
            max_failures,
            timeout_secs,
            half_open_attempts,
        }
    }

    pub fn state(&self) -> CircuitState {
        CircuitState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn transition(&self, from: CircuitState, to: CircuitState) -> bool {
        let changed = self
            .state
            .compare_exchange(
                from as u8,
                to as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if changed {
            self.last_state_change_epoch_ms
                .store(Utc::now().timestamp_millis(), Ordering::Release);
        }
        changed
    }

    /// Drives the `open -> half_open` transition as a side effect of being
    /// asked, then reports whether a call should be let through.
    pub fn allow(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => true,
            CircuitState::Open => {
                let elapsed_secs = (Utc::now().timestamp_millis()
                    - self.last_state_change_epoch_ms.load(Ordering::Acquire))
                    / 1000;
                if elapsed_secs >= self.timeout_secs {
                    self.transition(CircuitState::Open, CircuitState::HalfOpen);
                    self.success_count.store(0, Ordering::Release);
                    self.state() != CircuitState::Open
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        match self.state() {
            CircuitState::Closed => {
                self.failure_count.store(0, Ordering::Release);
            }
            CircuitState::HalfOpen => {
                let successes = self.success_count.fetch_add(1, Ordering::AcqRel) + 1;
                if successes >= self.half_open_attempts {
                    if self.transition(CircuitState::HalfOpen, CircuitState::Closed) {
                        self.failure_count.store(0, Ordering::Release);
                        self.success_count.store(0, Ordering::Release);
                    }
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        self.last_failure_at_epoch_ms
            .store(Utc::now().timestamp_millis(), Ordering::Release);
        match self.state() {
            CircuitState::Closed => {
                let failures = self.failure_count.fetch_add(1, Ordering::AcqRel) + 1;
                if failures >= self.max_failures {
                    self.transition(CircuitState::Closed, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                if self.transition(CircuitState::HalfOpen, CircuitState::Open) {
                    self.failure_count.store(0, Ordering::Release);
                }
            }
            CircuitState::Open => {}
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_FAILURES,
            DEFAULT_TIMEOUT_SECS,
            DEFAULT_HALF_OPEN_ATTEMPTS,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_max_failures() {
        let cb = CircuitBreaker::new(3, 30, 2);
        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.allow());
    }

    #[test]
    fn half_open_closes_after_successes() {
        let cb = CircuitBreaker::new(1, 0, 2);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(cb.allow());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_reopens_on_failure() {
        let cb = CircuitBreaker::new(1, 0, 2);
        cb.record_failure();
        cb.allow();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
    }
}
