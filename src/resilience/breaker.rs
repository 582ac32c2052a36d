//! Consecutive-failure circuit breaker.
//!
//! ```text
//! Closed --(failures >= threshold)--> Open
//! Open   --(now >= open_until)-----> Half-Open (next call admitted, counters reset)
//! ```
//!
//! A failed probe does not reopen immediately: the counter restarts from zero,
//! so `threshold` fresh failures are needed to trip again. One breaker gates
//! every operation of a provider instance.

use std::time::{Duration, Instant};

pub const DEFAULT_THRESHOLD: u32 = 3;
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    /// Cooldown elapsed; the next call is the probe.
    HalfOpen,
}

/// Point-in-time view for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSnapshot {
    pub consecutive_failures: u32,
    pub open_until: Option<Instant>,
}

#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    threshold: u32,
    cooldown: Duration,
    consecutive_failures: u32,
    open_until: Option<Instant>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_COOLDOWN)
    }
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            threshold: threshold.max(1),
            cooldown,
            consecutive_failures: 0,
            open_until: None,
        }
    }

    pub fn state(&self, now: Instant) -> CircuitState {
        match self.open_until {
            None => CircuitState::Closed,
            Some(until) if now < until => CircuitState::Open,
            Some(_) => CircuitState::HalfOpen,
        }
    }

    /// Gate a call at `now`. Returns false while open. Once the cooldown has
    /// elapsed the counters are reset before admitting the probe.
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        match self.state(now) {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => {
                self.reset();
                true
            }
        }
    }

    pub fn record_success(&mut self) {
        self.reset();
    }

    /// Count one failure. Returns true when this failure tripped the breaker.
    pub fn record_failure(&mut self, now: Instant) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures >= self.threshold {
            let was_open = self.open_until.is_some();
            self.open_until = Some(now + self.cooldown);
            return !was_open;
        }
        false
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        BreakerSnapshot {
            consecutive_failures: self.consecutive_failures,
            open_until: self.open_until,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    fn reset(&mut self) {
        self.consecutive_failures = 0;
        self.open_until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_exactly_at_threshold() {
        let mut b = CircuitBreaker::new(3, Duration::from_secs(30));
        let t0 = Instant::now();
        assert!(!b.record_failure(t0));
        assert!(!b.record_failure(t0));
        assert_eq!(b.state(t0), CircuitState::Closed);
        assert!(b.record_failure(t0), "third failure trips");
        assert_eq!(b.state(t0), CircuitState::Open);
        assert!(!b.try_acquire(t0 + Duration::from_secs(29)));
    }

    #[test]
    fn success_resets_counter() {
        let mut b = CircuitBreaker::default();
        let t0 = Instant::now();
        b.record_failure(t0);
        b.record_failure(t0);
        b.record_success();
        assert_eq!(b.snapshot().consecutive_failures, 0);
        b.record_failure(t0);
        assert_eq!(b.state(t0), CircuitState::Closed);
    }

    #[test]
    fn probe_failure_needs_full_threshold_again() {
        let mut b = CircuitBreaker::new(3, Duration::from_secs(30));
        let t0 = Instant::now();
        for _ in 0..3 {
            b.record_failure(t0);
        }
        let after = t0 + Duration::from_secs(30);
        assert_eq!(b.state(after), CircuitState::HalfOpen);
        assert!(b.try_acquire(after));
        assert_eq!(
            b.snapshot(),
            BreakerSnapshot {
                consecutive_failures: 0,
                open_until: None
            }
        );

        // Failed probe: counted from the post-reset baseline.
        assert!(!b.record_failure(after));
        assert!(b.try_acquire(after));
        assert_eq!(b.snapshot().consecutive_failures, 1);
    }

    #[test]
    fn zero_threshold_is_treated_as_one() {
        let mut b = CircuitBreaker::new(0, Duration::from_secs(1));
        assert_eq!(b.threshold(), 1);
        assert!(b.record_failure(Instant::now()));
    }
}
