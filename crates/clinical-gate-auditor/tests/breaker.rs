// crates/clinical-gate-auditor/tests/breaker.rs
// ============================================================================
// Module: Circuit Breaker Tests
// Description: State transitions of the consecutive-failure breaker.
// Purpose: Validate tripping, cool-down probing, and reset on success.
// ============================================================================

//! ## Overview
//! Runs on a paused tokio clock so the reset interval advances
//! deterministically.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::time::Duration;

use clinical_gate_auditor::CircuitBreaker;
use clinical_gate_auditor::CircuitBreakerConfig;
use clinical_gate_auditor::CircuitState;

fn breaker(threshold: u32, reset_secs: u64) -> CircuitBreaker {
    CircuitBreaker::new(CircuitBreakerConfig {
        failure_threshold: threshold,
        reset_interval: Duration::from_secs(reset_secs),
    })
}

#[tokio::test(start_paused = true)]
async fn opens_after_threshold_consecutive_failures() {
    let breaker = breaker(3, 60);
    for _ in 0 .. 2 {
        assert!(breaker.try_acquire());
        breaker.record_failure();
    }
    assert_eq!(breaker.snapshot().state, CircuitState::Closed);
    assert!(breaker.try_acquire());
    breaker.record_failure();

    let snapshot = breaker.snapshot();
    assert_eq!(snapshot.state, CircuitState::Open);
    assert_eq!(snapshot.consecutive_failures, 3);
    assert!(snapshot.last_failure.is_some());
    assert!(!breaker.try_acquire());
}

#[tokio::test(start_paused = true)]
async fn success_resets_the_failure_count() {
    let breaker = breaker(3, 60);
    breaker.record_failure();
    breaker.record_failure();
    breaker.record_success();
    breaker.record_failure();
    breaker.record_failure();
    assert_eq!(breaker.snapshot().state, CircuitState::Closed);
    assert_eq!(breaker.snapshot().consecutive_failures, 2);
}

#[tokio::test(start_paused = true)]
async fn probes_after_reset_interval_and_reopens_on_failure() {
    let breaker = breaker(2, 30);
    breaker.record_failure();
    breaker.record_failure();
    assert!(!breaker.try_acquire());

    tokio::time::advance(Duration::from_secs(29)).await;
    assert!(!breaker.try_acquire());

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(breaker.snapshot().state, CircuitState::HalfOpen);
    assert!(breaker.try_acquire());
    assert_eq!(breaker.snapshot().state, CircuitState::Closed);

    breaker.record_failure();
    assert_eq!(breaker.snapshot().state, CircuitState::Open);
    assert!(!breaker.try_acquire());
}

#[tokio::test(start_paused = true)]
async fn successful_probe_closes_the_breaker() {
    let breaker = breaker(1, 10);
    breaker.record_failure();
    assert!(!breaker.try_acquire());
    tokio::time::advance(Duration::from_secs(10)).await;
    assert!(breaker.try_acquire());
    breaker.record_success();

    let snapshot = breaker.snapshot();
    assert_eq!(snapshot.state, CircuitState::Closed);
    assert_eq!(snapshot.consecutive_failures, 0);
    assert!(breaker.try_acquire());
}

#[tokio::test(start_paused = true)]
async fn zero_threshold_behaves_like_one() {
    let breaker = breaker(0, 10);
    assert!(breaker.try_acquire());
    breaker.record_failure();
    assert!(!breaker.try_acquire());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_failures_are_not_lost() {
    let breaker = Arc::new(breaker(1_000, 60));
    let mut handles = Vec::new();
    for _ in 0 .. 8 {
        let breaker = Arc::clone(&breaker);
        handles.push(tokio::spawn(async move {
            for _ in 0 .. 50 {
                breaker.record_failure();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(breaker.snapshot().consecutive_failures, 400);
    assert_eq!(breaker.snapshot().state, CircuitState::Closed);
}
