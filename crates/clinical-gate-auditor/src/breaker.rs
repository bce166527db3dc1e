// crates/clinical-gate-auditor/src/breaker.rs
// ============================================================================
// Module: Circuit Breaker
// Description: Consecutive-failure breaker guarding the remote model.
// Purpose: Bound caller latency and protect the provider during outages.
// Dependencies: tokio, tracing
// ============================================================================

//! ## Overview
//! Three conceptual states are realized with a failure count and an open
//! flag. While closed every call is attempted; a success resets the count and
//! a failure increments it. Reaching the threshold opens the breaker and
//! calls short-circuit. Once the reset interval has elapsed since the last
//! failure, the next call is let through with the breaker optimistically
//! closed; the failure count is kept, so a failed probe reopens immediately.
//!
//! State lives behind a mutex owned by one gateway instance; read-modify-write
//! sequences never interleave. Time is read from `tokio::time` so paused-clock
//! tests drive the reset interval deterministically.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default consecutive failures that open the breaker.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
/// Default cool-down before a half-open probe.
pub const DEFAULT_RESET_INTERVAL: Duration = Duration::from_secs(60);

/// Circuit breaker configuration.
///
/// # Invariants
/// - `failure_threshold >= 1` (zero is treated as one).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the breaker.
    pub failure_threshold: u32,
    /// Time since the last failure after which a probe is allowed.
    pub reset_interval: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reset_interval: DEFAULT_RESET_INTERVAL,
        }
    }
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Calls are attempted.
    Closed,
    /// Calls short-circuit.
    Open,
    /// Open, but the next call will be let through as a probe.
    HalfOpen,
}

/// Point-in-time breaker view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    /// Derived state.
    pub state: CircuitState,
    /// Consecutive failures recorded.
    pub consecutive_failures: u32,
    /// Instant of the last recorded failure.
    pub last_failure: Option<Instant>,
}

/// Mutable breaker state.
#[derive(Debug, Default)]
struct BreakerState {
    /// Consecutive failures.
    failures: u32,
    /// Last failure instant.
    last_failure: Option<Instant>,
    /// Open flag.
    open: bool,
}

// ============================================================================
// SECTION: Circuit Breaker
// ============================================================================

/// Consecutive-failure circuit breaker.
#[derive(Debug, Default)]
pub struct CircuitBreaker {
    /// Breaker configuration.
    config: CircuitBreakerConfig,
    /// Guarded state.
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    /// Creates a closed breaker.
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(BreakerState::default()),
        }
    }

    /// Returns the breaker configuration.
    #[must_use]
    pub const fn config(&self) -> CircuitBreakerConfig {
        self.config
    }

    /// Decides whether a call may proceed.
    ///
    /// Returns `false` while open. An elapsed reset interval turns the call
    /// into a half-open probe and closes the breaker before returning `true`.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.lock();
        if !state.open {
            return true;
        }
        let cooled = state
            .last_failure
            .is_none_or(|last| last.elapsed() >= self.config.reset_interval);
        if cooled {
            state.open = false;
            info!(failures = state.failures, "circuit breaker half-open; probing remote model");
            return true;
        }
        false
    }

    /// Records a successful call.
    pub fn record_success(&self) {
        let mut state = self.lock();
        if state.failures > 0 {
            info!(previous_failures = state.failures, "circuit breaker reset after success");
        }
        state.failures = 0;
        state.open = false;
    }

    /// Records a failed call, opening the breaker at the threshold.
    pub fn record_failure(&self) {
        let mut state = self.lock();
        state.failures = state.failures.saturating_add(1);
        state.last_failure = Some(Instant::now());
        if !state.open && state.failures >= self.config.failure_threshold.max(1) {
            state.open = true;
            warn!(
                failures = state.failures,
                reset_ms = u64::try_from(self.config.reset_interval.as_millis()).unwrap_or(u64::MAX),
                "circuit breaker opened"
            );
        }
    }

    /// Returns a point-in-time view of the breaker.
    #[must_use]
    pub fn snapshot(&self) -> BreakerSnapshot {
        let state = self.lock();
        let derived = if !state.open {
            CircuitState::Closed
        } else if state
            .last_failure
            .is_none_or(|last| last.elapsed() >= self.config.reset_interval)
        {
            CircuitState::HalfOpen
        } else {
            CircuitState::Open
        };
        BreakerSnapshot {
            state: derived,
            consecutive_failures: state.failures,
            last_failure: state.last_failure,
        }
    }

    /// Locks the state, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
