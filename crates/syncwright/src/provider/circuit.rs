//! Per-tenant circuit breakers for outbound provider calls.
//!
//! ```text
//! CLOSED --threshold failures--> OPEN --open_duration--> HALF_OPEN
//!   ^                                                      |
//!   +---------------- trial call succeeds -----------------+
//!                   trial call fails -> OPEN
//! ```
//!
//! While open, calls fail fast with [`SyncError::CircuitOpen`]. Half-open
//! admits exactly one trial call.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{Result, SyncError};
use crate::tenant::TenantId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed { failures: u32 },
    Open { until: Instant },
    /// A trial call is in flight.
    HalfOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitConfig {
    pub failure_threshold: u32,
    pub open_duration: Duration,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_duration: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Default)]
pub struct CircuitRegistry {
    config: CircuitConfig,
    states: Mutex<HashMap<TenantId, CircuitState>>,
}

impl CircuitRegistry {
    pub fn new(config: CircuitConfig) -> Self {
        Self {
            config,
            states: Mutex::new(HashMap::new()),
        }
    }

    fn with_state<T>(&self, tenant: TenantId, f: impl FnOnce(&mut CircuitState) -> T) -> T {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        let state = states
            .entry(tenant)
            .or_insert(CircuitState::Closed { failures: 0 });
        f(state)
    }

    /// Admit a call or fail fast.
    pub fn check(&self, tenant: TenantId) -> Result<()> {
        let now = Instant::now();
        self.with_state(tenant, |state| match *state {
            CircuitState::Closed { .. } => Ok(()),
            CircuitState::Open { until } if now >= until => {
                tracing::info!(tenant, "circuit half-open, probing");
                *state = CircuitState::HalfOpen;
                Ok(())
            }
            CircuitState::Open { .. } | CircuitState::HalfOpen => {
                Err(SyncError::CircuitOpen { tenant })
            }
        })
    }

    pub fn record_success(&self, tenant: TenantId) {
        self.with_state(tenant, |state| {
            if matches!(state, CircuitState::HalfOpen) {
                tracing::info!(tenant, "circuit closed");
            }
            *state = CircuitState::Closed { failures: 0 };
        });
    }

    pub fn record_failure(&self, tenant: TenantId) {
        let config = self.config;
        let until = Instant::now() + config.open_duration;
        self.with_state(tenant, |state| match *state {
            CircuitState::Closed { failures } if failures + 1 >= config.failure_threshold => {
                tracing::warn!(tenant, failures = failures + 1, "circuit opened");
                *state = CircuitState::Open { until };
            }
            CircuitState::Closed { failures } => {
                *state = CircuitState::Closed {
                    failures: failures + 1,
                };
            }
            CircuitState::HalfOpen => {
                tracing::warn!(tenant, "trial call failed, circuit reopened");
                *state = CircuitState::Open { until };
            }
            CircuitState::Open { .. } => {}
        });
    }

    pub fn state(&self, tenant: TenantId) -> CircuitState {
        self.with_state(tenant, |state| *state)
    }

    /// Whether calls for `tenant` would currently fail fast.
    pub fn is_open(&self, tenant: TenantId) -> bool {
        let now = Instant::now();
        self.with_state(tenant, |state| match *state {
            CircuitState::Open { until } => now < until,
            CircuitState::HalfOpen => true,
            CircuitState::Closed { .. } => false,
        })
    }

    /// Forget the tenant's breaker state.
    pub fn reset(&self, tenant: TenantId) {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        states.remove(&tenant);
    }
}
