//! Per-provider circuit breaker.
//!
//! CLOSED → OPEN once `failure_threshold` tracked failures accumulate.
//! OPEN → HALF_OPEN after `recovery_timeout`, handing out exactly one probe.
//! The probe's outcome moves the breaker to CLOSED (success) or back to OPEN
//! with a fresh timer (failure).
//!
//! The breaker lives behind a `std::sync::Mutex` owned by its provider. Calls
//! take a [`BreakerPermit`] before suspending; the lock is never held across
//! an `.await`. Only the permit that holds the HALF_OPEN probe can settle or
//! release it; outcomes reported through permits granted earlier, while the
//! breaker was still CLOSED, never touch the probe. Dropping a permit without
//! reporting an outcome (for example when the caller's future is cancelled)
//! releases the probe if that permit held it.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CodieError;

/// Default number of tracked failures before opening.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default time spent OPEN before a probe is allowed.
pub const DEFAULT_RECOVERY_TIMEOUT: Duration = Duration::from_secs(60);

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thresholds for a breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout: DEFAULT_RECOVERY_TIMEOUT,
        }
    }
}

/// Point-in-time view of a breaker for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub state: BreakerState,
    pub failure_count: u32,
    pub last_failure: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    provider: String,
    settings: BreakerSettings,
    state: BreakerState,
    failure_count: u32,
    last_failure: Option<Instant>,
    last_failure_at: Option<DateTime<Utc>>,
    probe_in_flight: bool,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(provider: impl Into<String>, settings: BreakerSettings) -> Self {
        Self {
            provider: provider.into(),
            settings,
            state: BreakerState::Closed,
            failure_count: 0,
            last_failure: None,
            last_failure_at: None,
            probe_in_flight: false,
        }
    }

    #[must_use]
    pub const fn state(&self) -> BreakerState {
        self.state
    }

    #[must_use]
    pub const fn failure_count(&self) -> u32 {
        self.failure_count
    }

    #[must_use]
    pub fn snapshot(&self) -> BreakerSnapshot {
        BreakerSnapshot {
            state: self.state,
            failure_count: self.failure_count,
            last_failure: self.last_failure_at,
        }
    }

    /// Whether a call may proceed now.
    pub fn can_execute(&mut self) -> bool {
        self.can_execute_at(Instant::now())
    }

    /// Whether a call may proceed at `now`.
    ///
    /// In OPEN, transitions to HALF_OPEN once the recovery timeout has
    /// elapsed and grants the single probe. In HALF_OPEN, grants the probe
    /// only if it has not been handed out.
    pub fn can_execute_at(&mut self, now: Instant) -> bool {
        self.grant_at(now).is_some()
    }

    fn grant_at(&mut self, now: Instant) -> Option<Grant> {
        match self.state {
            BreakerState::Closed => Some(Grant::Normal),
            BreakerState::Open => {
                let recovered = self.last_failure.is_none_or(|at| {
                    now.saturating_duration_since(at) >= self.settings.recovery_timeout
                });
                if !recovered {
                    return None;
                }
                self.state = BreakerState::HalfOpen;
                self.probe_in_flight = true;
                tracing::info!(provider = %self.provider, "Circuit breaker half-open, probing");
                Some(Grant::Probe)
            }
            BreakerState::HalfOpen if self.probe_in_flight => None,
            BreakerState::HalfOpen => {
                self.probe_in_flight = true;
                Some(Grant::Probe)
            }
        }
    }

    /// Record a successful call: reset and close.
    pub fn on_success(&mut self) {
        if self.state != BreakerState::Closed {
            tracing::info!(provider = %self.provider, "Circuit breaker reset to closed");
        }
        self.failure_count = 0;
        self.state = BreakerState::Closed;
        self.probe_in_flight = false;
    }

    /// Record a failed call. Returns whether the error counted.
    ///
    /// Only breaker-tracked errors count; others release a held probe and
    /// leave the state untouched.
    pub fn on_failure(&mut self, error: &CodieError) -> bool {
        self.on_failure_at(error, Instant::now())
    }

    pub fn on_failure_at(&mut self, error: &CodieError, now: Instant) -> bool {
        self.probe_in_flight = false;
        if !error.is_breaker_tracked() {
            return false;
        }

        self.failure_count = self.failure_count.saturating_add(1);
        self.last_failure = Some(now);
        self.last_failure_at = Some(Utc::now());

        if self.state == BreakerState::HalfOpen
            || self.failure_count >= self.settings.failure_threshold
        {
            self.state = BreakerState::Open;
            tracing::warn!(
                provider = %self.provider,
                failures = self.failure_count,
                "Circuit breaker opened"
            );
        } else {
            tracing::warn!(
                provider = %self.provider,
                failures = self.failure_count,
                threshold = self.settings.failure_threshold,
                "Circuit breaker failure recorded"
            );
        }
        true
    }

    /// Give back an unused HALF_OPEN probe.
    pub fn release_probe(&mut self) {
        self.probe_in_flight = false;
    }

    /// Success reported through a permit. A permit granted before the
    /// breaker left CLOSED only resets the count while it is still CLOSED.
    fn settle_success(&mut self, grant: Grant) {
        match (grant, self.state) {
            (Grant::Probe, _) | (Grant::Normal, BreakerState::Closed) => self.on_success(),
            (Grant::Normal, state) => {
                tracing::debug!(
                    provider = %self.provider,
                    %state,
                    "Ignoring success from a call granted before opening"
                );
            }
        }
    }

    /// Failure reported through a permit. A permit granted before the
    /// breaker left CLOSED is not counted once it has opened.
    fn settle_failure(&mut self, grant: Grant, error: &CodieError, now: Instant) -> bool {
        match (grant, self.state) {
            (Grant::Probe, _) | (Grant::Normal, BreakerState::Closed) => {
                self.on_failure_at(error, now)
            }
            (Grant::Normal, state) => {
                tracing::debug!(
                    provider = %self.provider,
                    %state,
                    "Ignoring failure from a call granted before opening"
                );
                false
            }
        }
    }
}

/// Kind of call a breaker allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grant {
    Normal,
    /// The single HALF_OPEN trial call.
    Probe,
}

// =============================================================================
// Permits
// =============================================================================

/// Lock a breaker mutex, recovering from poisoning.
pub fn lock(breaker: &Mutex<CircuitBreaker>) -> MutexGuard<'_, CircuitBreaker> {
    breaker.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Permission to make one call through a breaker.
///
/// Report the outcome with [`BreakerPermit::success`] or
/// [`BreakerPermit::failure`]. Dropping the permit unreported releases the
/// probe, if this permit holds it, without recording anything.
#[derive(Debug)]
pub struct BreakerPermit<'a> {
    breaker: &'a Mutex<CircuitBreaker>,
    grant: Grant,
    settled: bool,
}

impl<'a> BreakerPermit<'a> {
    /// Ask the breaker for a permit.
    pub fn acquire(breaker: &'a Mutex<CircuitBreaker>) -> Option<Self> {
        let grant = lock(breaker).grant_at(Instant::now())?;
        Some(Self {
            breaker,
            grant,
            settled: false,
        })
    }

    /// Whether this permit is the HALF_OPEN probe.
    #[must_use]
    pub fn is_probe(&self) -> bool {
        self.grant == Grant::Probe
    }

    pub fn success(mut self) {
        self.settled = true;
        lock(self.breaker).settle_success(self.grant);
    }

    pub fn failure(mut self, error: &CodieError) {
        self.settled = true;
        lock(self.breaker).settle_failure(self.grant, error, Instant::now());
    }
}

impl Drop for BreakerPermit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.is_probe() {
            lock(self.breaker).release_probe();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unavailable() -> CodieError {
        CodieError::unavailable("gemini", "HTTP 503")
    }

    fn breaker(threshold: u32, recovery: Duration) -> CircuitBreaker {
        CircuitBreaker::new(
            "gemini",
            BreakerSettings {
                failure_threshold: threshold,
                recovery_timeout: recovery,
            },
        )
    }

    #[test]
    fn defaults() {
        let settings = BreakerSettings::default();
        assert_eq!(settings.failure_threshold, 5);
        assert_eq!(settings.recovery_timeout, Duration::from_secs(60));
    }

    #[test]
    fn opens_at_threshold_and_blocks_until_recovery() {
        let mut cb = breaker(3, Duration::from_secs(60));
        let t0 = Instant::now();

        for _ in 0..2 {
            assert!(cb.can_execute_at(t0));
            cb.on_failure_at(&unavailable(), t0);
        }
        assert_eq!(cb.state(), BreakerState::Closed);

        cb.on_failure_at(&unavailable(), t0);
        assert_eq!(cb.state(), BreakerState::Open);
        assert_eq!(cb.failure_count(), 3);

        assert!(!cb.can_execute_at(t0 + Duration::from_secs(59)));
        assert_eq!(cb.state(), BreakerState::Open);
    }

    #[test]
    fn half_open_grants_exactly_one_probe() {
        let mut cb = breaker(1, Duration::from_secs(60));
        let t0 = Instant::now();
        cb.on_failure_at(&unavailable(), t0);

        let later = t0 + Duration::from_secs(60);
        assert!(cb.can_execute_at(later));
        assert_eq!(cb.state(), BreakerState::HalfOpen);
        assert!(!cb.can_execute_at(later));
        assert!(!cb.can_execute_at(later + Duration::from_secs(1)));
    }

    #[test]
    fn successful_probe_closes() {
        let mut cb = breaker(1, Duration::from_secs(60));
        let t0 = Instant::now();
        cb.on_failure_at(&unavailable(), t0);
        assert!(cb.can_execute_at(t0 + Duration::from_secs(61)));

        cb.on_success();
        assert_eq!(cb.state(), BreakerState::Closed);
        assert_eq!(cb.failure_count(), 0);
        assert!(cb.can_execute());
    }

    #[test]
    fn failed_probe_reopens_with_fresh_timer() {
        let mut cb = breaker(1, Duration::from_secs(60));
        let t0 = Instant::now();
        cb.on_failure_at(&unavailable(), t0);

        let t1 = t0 + Duration::from_secs(60);
        assert!(cb.can_execute_at(t1));
        cb.on_failure_at(&unavailable(), t1);
        assert_eq!(cb.state(), BreakerState::Open);

        assert!(!cb.can_execute_at(t1 + Duration::from_secs(30)));
        assert!(cb.can_execute_at(t1 + Duration::from_secs(60)));
    }

    #[test]
    fn untracked_errors_do_not_count() {
        let mut cb = breaker(1, Duration::from_secs(60));
        assert!(!cb.on_failure(&CodieError::EmptyCode));
        assert!(!cb.on_failure(&CodieError::ParseResponse("bad json".into())));
        assert_eq!(cb.state(), BreakerState::Closed);
        assert_eq!(cb.failure_count(), 0);
        assert!(cb.snapshot().last_failure.is_none());
    }

    #[test]
    fn untracked_error_releases_probe() {
        let mut cb = breaker(1, Duration::from_secs(60));
        let t0 = Instant::now();
        cb.on_failure_at(&unavailable(), t0);
        let t1 = t0 + Duration::from_secs(60);
        assert!(cb.can_execute_at(t1));

        cb.on_failure_at(&CodieError::ParseResponse("x".into()), t1);
        assert_eq!(cb.state(), BreakerState::HalfOpen);
        assert!(cb.can_execute_at(t1));
    }

    #[test]
    fn snapshot_records_last_failure() {
        let mut cb = breaker(5, Duration::from_secs(60));
        cb.on_failure(&CodieError::Network("reset".into()));
        let snap = cb.snapshot();
        assert_eq!(snap.state, BreakerState::Closed);
        assert_eq!(snap.failure_count, 1);
        assert!(snap.last_failure.is_some());
    }

    #[test]
    fn dropped_permit_releases_probe() {
        let cb = Mutex::new(breaker(1, Duration::ZERO));
        lock(&cb).on_failure(&unavailable());

        let permit = BreakerPermit::acquire(&cb).expect("probe granted");
        assert!(BreakerPermit::acquire(&cb).is_none());
        drop(permit);

        assert_eq!(lock(&cb).state(), BreakerState::HalfOpen);
        assert_eq!(lock(&cb).failure_count(), 1);
        let retry = BreakerPermit::acquire(&cb).expect("probe released");
        retry.success();
        assert_eq!(lock(&cb).state(), BreakerState::Closed);
    }

    #[test]
    fn permit_from_closed_state_cannot_release_the_probe() {
        let cb = Mutex::new(breaker(1, Duration::ZERO));

        let early = BreakerPermit::acquire(&cb).expect("closed breaker grants");
        assert!(!early.is_probe());
        lock(&cb).on_failure(&unavailable());
        assert_eq!(lock(&cb).state(), BreakerState::Open);

        let probe = BreakerPermit::acquire(&cb).expect("probe granted");
        assert!(probe.is_probe());
        assert!(BreakerPermit::acquire(&cb).is_none());

        drop(early);
        assert!(BreakerPermit::acquire(&cb).is_none(), "probe still in flight");

        probe.success();
        assert_eq!(lock(&cb).state(), BreakerState::Closed);
    }

    #[test]
    fn early_permit_outcomes_leave_half_open_probe_alone() {
        let cb = Mutex::new(breaker(1, Duration::ZERO));
        let untracked = BreakerPermit::acquire(&cb).unwrap();
        let succeeded = BreakerPermit::acquire(&cb).unwrap();
        let tracked = BreakerPermit::acquire(&cb).unwrap();
        lock(&cb).on_failure(&unavailable());
        let probe = BreakerPermit::acquire(&cb).expect("probe granted");

        untracked.failure(&CodieError::ParseResponse("bad body".into()));
        assert!(BreakerPermit::acquire(&cb).is_none());

        succeeded.success();
        assert_eq!(lock(&cb).state(), BreakerState::HalfOpen);
        assert!(BreakerPermit::acquire(&cb).is_none());

        tracked.failure(&unavailable());
        assert_eq!(lock(&cb).state(), BreakerState::HalfOpen);
        assert_eq!(lock(&cb).failure_count(), 1);
        assert!(BreakerPermit::acquire(&cb).is_none());

        probe.failure(&unavailable());
        assert_eq!(lock(&cb).state(), BreakerState::Open);
        assert_eq!(lock(&cb).failure_count(), 2);
    }

    #[test]
    fn state_serializes_snake_case() {
        let json = serde_json::to_string(&BreakerState::HalfOpen).unwrap();
        assert_eq!(json, "\"half_open\"");
    }
}
