// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Remote API health tracking with a circuit breaker.
//
// Once the library server has failed a few times in a row, stop sending it
// requests that will only time out and go straight to the local store. After
// a cooldown one request is let through to see whether it is back.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Requests go to the remote store.
    Closed,
    /// Too many failures; the local store is used until the cooldown ends.
    Open,
    /// Cooldown over; the next request is a trial.
    HalfOpen,
}

/// Health of the remote store.
#[derive(Debug, Clone)]
pub struct RemoteHealth {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    last_error: Option<String>,
    failure_threshold: u32,
}

impl Default for RemoteHealth {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteHealth {
    pub fn new() -> Self {
        Self::with_threshold(3)
    }

    /// Open the circuit after `failure_threshold` consecutive failures.
    pub fn with_threshold(failure_threshold: u32) -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
            last_error: None,
            failure_threshold: failure_threshold.max(1),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether the next request may go to the remote store.
    pub fn allow_request(&mut self) -> bool {
        match self.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let cooldown = cooldown_duration(self.consecutive_failures);
                match self.opened_at {
                    Some(opened_at) if opened_at.elapsed() < cooldown => {
                        debug!(
                            remaining_ms = (cooldown - opened_at.elapsed()).as_millis(),
                            "circuit open, using local store"
                        );
                        false
                    }
                    _ => {
                        info!("circuit half-open, retrying remote store");
                        self.state = CircuitState::HalfOpen;
                        true
                    }
                }
            }
            // The trial request is already out.
            CircuitState::HalfOpen => false,
        }
    }

    pub fn record_success(&mut self) {
        if self.state != CircuitState::Closed {
            info!(prev_state = ?self.state, "remote store recovered, closing circuit");
        }
        self.state = CircuitState::Closed;
        self.consecutive_failures = 0;
        self.opened_at = None;
        self.last_error = None;
    }

    pub fn record_failure(&mut self, error: &str) {
        self.consecutive_failures += 1;
        self.last_error = Some(error.to_string());

        if self.state == CircuitState::HalfOpen {
            warn!("trial request failed, reopening circuit");
            self.state = CircuitState::Open;
            self.opened_at = Some(Instant::now());
        } else if self.consecutive_failures >= self.failure_threshold
            && self.state == CircuitState::Closed
        {
            warn!(failures = self.consecutive_failures, "opening circuit for remote store");
            self.state = CircuitState::Open;
            self.opened_at = Some(Instant::now());
        }
    }

    /// Open the circuit straight away, e.g. after a failed health check.
    pub fn trip(&mut self, error: &str) {
        self.consecutive_failures = self.consecutive_failures.max(self.failure_threshold);
        self.last_error = Some(error.to_string());
        if self.state != CircuitState::Open {
            warn!(error, "remote store marked unreachable");
        }
        self.state = CircuitState::Open;
        self.opened_at = Some(Instant::now());
    }

    /// Message for the user while the remote store is being bypassed.
    pub fn status_message(&self) -> Option<String> {
        match self.state {
            CircuitState::Closed => None,
            CircuitState::Open => {
                let remaining = self
                    .opened_at
                    .map(|t| cooldown_duration(self.consecutive_failures).saturating_sub(t.elapsed()))
                    .unwrap_or(Duration::ZERO);
                Some(format!(
                    "The library server isn't responding ({} failures). Working offline; \
                     trying again in {} seconds.",
                    self.consecutive_failures,
                    remaining.as_secs()
                ))
            }
            CircuitState::HalfOpen => Some("Checking whether the library server is back...".into()),
        }
    }
}

/// Cooldown grows with the failure streak: 15 s, then 1 min from 5
/// failures, then 5 min from 10.
fn cooldown_duration(failures: u32) -> Duration {
    match failures {
        0..=4 => Duration::from_secs(15),
        5..=9 => Duration::from_secs(60),
        _ => Duration::from_secs(300),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tracker_allows_requests() {
        let mut health = RemoteHealth::new();
        assert!(health.allow_request());
        assert!(health.status_message().is_none());
    }

    #[test]
    fn circuit_opens_after_threshold() {
        let mut health = RemoteHealth::new();
        health.record_failure("refused");
        health.record_failure("refused");
        assert!(health.allow_request());

        health.record_failure("refused");
        assert_eq!(health.state(), CircuitState::Open);
        assert!(!health.allow_request());
        assert!(health.status_message().expect("message").contains("offline"));
    }

    #[test]
    fn success_closes_circuit() {
        let mut health = RemoteHealth::with_threshold(1);
        health.record_failure("timeout");
        assert!(!health.allow_request());

        health.record_success();
        assert!(health.allow_request());
        assert_eq!(health.consecutive_failures(), 0);
        assert!(health.last_error().is_none());
    }

    #[test]
    fn trip_opens_immediately() {
        let mut health = RemoteHealth::new();
        health.trip("connection refused");
        assert_eq!(health.state(), CircuitState::Open);
        assert_eq!(health.last_error(), Some("connection refused"));
        assert!(!health.allow_request());
    }

    #[test]
    fn cooldown_grows_with_failures() {
        assert!(cooldown_duration(3) < cooldown_duration(5));
        assert!(cooldown_duration(5) < cooldown_duration(12));
    }
}
