//! Five consecutive backend failures open a service's circuit; while open,
//! the breaker refuses calls without being asked to record another
//! failure. After its timeout elapses the breaker moves to half-open and
//! lets calls through again, and enough consecutive successes close it.
//! A second, unrelated service's breaker is untouched throughout —
//! breakers are keyed per service, not global.
//!
//! Real time, not a mock clock, drives the timeout here, so this test uses
//! a one-second timeout rather than the production default of thirty to
//! keep it fast; the state machine itself is identical.

#[path = "../common/mod.rs"]
mod common;

use knockgate_application::services::CircuitBreakerRegistry;
use knockgate_domain::ServiceId;

#[tokio::test]
async fn breaker_opens_half_opens_and_closes_independently_per_service() {
    let registry = CircuitBreakerRegistry::new(5, 1, 3);
    let flaky: ServiceId = "svc-flaky".into();
    let stable: ServiceId = "svc-stable".into();

    for _ in 0..4 {
        registry.record_failure(&flaky);
        assert!(registry.allow(&flaky), "must stay closed before the 5th failure");
    }
    registry.record_failure(&flaky);
    assert!(!registry.allow(&flaky), "circuit opens on the 5th consecutive failure");

    assert!(registry.allow(&stable), "an unrelated service's breaker must be unaffected");

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    assert!(registry.allow(&flaky), "the first call after the timeout is let through as a probe");

    registry.record_success(&flaky);
    registry.record_success(&flaky);
    registry.record_success(&flaky);
    assert!(registry.allow(&flaky), "3 consecutive successes close the circuit");

    registry.record_failure(&flaky);
    assert!(registry.allow(&flaky), "a single failure right after closing does not reopen it");

    assert!(registry.allow(&stable), "stable service never needed a probe");
}
