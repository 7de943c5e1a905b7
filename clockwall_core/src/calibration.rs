//! Clock calibration: latency-compensated sampling of several time sources and
//! selection of a single offset.
//!
//! Each pass samples every source once. A source that fails is logged and
//! skipped; it never aborts the pass. Among the successful samples the one
//! with the smallest absolute offset wins (the least disruptive correction).
//! If nothing succeeds the shared state is left untouched.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

use clockwall_traits::{Clock, TimeSource};

use crate::error::{ClockError, SourceFailureKind};
use crate::source_error::map_source_error;

/// Default per-source request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of querying one source once.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSample {
    pub source_id: String,
    /// Estimated authoritative time minus local wall time, in ms.
    pub raw_offset_ms: f64,
    pub succeeded: bool,
    pub round_trip_ms: f64,
    pub failure: Option<SourceFailureKind>,
}

impl TimeSample {
    fn failed(source_id: &str, round_trip_ms: f64, kind: SourceFailureKind) -> Self {
        Self {
            source_id: source_id.to_string(),
            raw_offset_ms: f64::NAN,
            succeeded: false,
            round_trip_ms,
            failure: Some(kind),
        }
    }
}

/// Shared current offset.
///
/// Single writer (the engine), any number of readers. Both fields are plain
/// atomics so a reader never observes a torn value.
#[derive(Debug)]
pub struct CalibrationState {
    offset_bits: AtomicU64,
    /// Wall-clock ms of the last commit; `i64::MIN` until the first one.
    last_updated_ms: AtomicI64,
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl CalibrationState {
    pub fn new(initial_offset_ms: f64) -> Self {
        let initial = if initial_offset_ms.is_finite() {
            initial_offset_ms
        } else {
            0.0
        };
        Self {
            offset_bits: AtomicU64::new(initial.to_bits()),
            last_updated_ms: AtomicI64::new(i64::MIN),
        }
    }

    pub fn shared(initial_offset_ms: f64) -> Arc<Self> {
        Arc::new(Self::new(initial_offset_ms))
    }

    #[inline]
    pub fn offset_ms(&self) -> f64 {
        f64::from_bits(self.offset_bits.load(Ordering::Acquire))
    }

    /// Wall-clock ms at which the offset was last committed.
    pub fn last_updated_at(&self) -> Option<i64> {
        match self.last_updated_ms.load(Ordering::Acquire) {
            i64::MIN => None,
            v => Some(v),
        }
    }

    /// Commit a new offset. Non-finite values are rejected and leave the state as is.
    pub fn commit(&self, offset_ms: f64, at_wall_ms: f64) -> bool {
        if !offset_ms.is_finite() {
            return false;
        }
        // Offset first: a reader seeing the new timestamp also sees the new offset
        self.offset_bits
            .store(offset_ms.to_bits(), Ordering::Release);
        self.last_updated_ms
            .store(at_wall_ms as i64, Ordering::Release);
        true
    }

    /// Local wall time corrected by the committed offset.
    #[inline]
    pub fn corrected_now_ms<C: Clock + ?Sized>(&self, clock: &C) -> f64 {
        clock.wall_ms() + self.offset_ms()
    }
}

/// Query one source with half round-trip compensation.
///
/// `t0`/`t1` bracket the request on the monotonic clock; the source's instant
/// is assumed to be taken halfway through, so the estimate at `t1` is
/// `server + rtt / 2`, compared with local wall time at `t1`.
pub fn sample_source<S, C>(source: &mut S, clock: &C, timeout: Duration) -> TimeSample
where
    S: TimeSource + ?Sized,
    C: Clock + ?Sized,
{
    let t0 = clock.now();
    let result = source.fetch(timeout);
    let t1 = clock.now();
    let local_at_t1 = clock.wall_ms();
    let round_trip_ms = t1.saturating_duration_since(t0).as_secs_f64() * 1000.0;
    let id = source.id();

    match result {
        Ok(server_ms) => {
            let offset = server_ms + round_trip_ms / 2.0 - local_at_t1;
            if !offset.is_finite() {
                tracing::warn!(source = %id, server_ms, "time source returned a non-finite instant");
                return TimeSample::failed(id, round_trip_ms, SourceFailureKind::Malformed);
            }
            tracing::debug!(source = %id, offset_ms = offset, rtt_ms = round_trip_ms, "time sample");
            TimeSample {
                source_id: id.to_string(),
                raw_offset_ms: offset,
                succeeded: true,
                round_trip_ms,
                failure: None,
            }
        }
        Err(e) => {
            let err = map_source_error(id, e.as_ref());
            tracing::debug!(error = %err, "time source unavailable");
            let kind = match err {
                ClockError::SourceUnavailable { kind, .. } => kind,
                _ => SourceFailureKind::Network,
            };
            TimeSample::failed(id, round_trip_ms, kind)
        }
    }
}

/// Pick the successful sample with the smallest absolute offset.
///
/// Ties go to the earlier sample, i.e. the first configured source.
pub fn select_offset(samples: &[TimeSample]) -> Option<f64> {
    samples
        .iter()
        .filter(|s| s.succeeded && s.raw_offset_ms.is_finite())
        .map(|s| s.raw_offset_ms)
        .min_by(|a, b| a.abs().total_cmp(&b.abs()))
}

/// What one calibration pass did.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationOutcome {
    pub previous_offset_ms: f64,
    /// Offset in effect after the pass (equal to previous when not applied).
    pub offset_ms: f64,
    pub samples: Vec<TimeSample>,
    /// False when every source failed.
    pub applied: bool,
}

impl CalibrationOutcome {
    pub fn drift_ms(&self) -> f64 {
        (self.offset_ms - self.previous_offset_ms).abs()
    }

    /// Whether the aligned ticker should be re-armed after this pass.
    pub fn needs_reschedule(&self, threshold_ms: f64) -> bool {
        self.applied && self.drift_ms() >= threshold_ms
    }

    pub fn succeeded(&self) -> usize {
        self.samples.iter().filter(|s| s.succeeded).count()
    }
}

pub type BoxedSource = Box<dyn TimeSource + Send>;

/// Owns the sources and is the only writer of the shared state.
pub struct CalibrationEngine<C: Clock> {
    sources: Vec<BoxedSource>,
    state: Arc<CalibrationState>,
    clock: C,
    timeout: Duration,
}

impl<C: Clock> CalibrationEngine<C> {
    pub fn new(sources: Vec<BoxedSource>, state: Arc<CalibrationState>, clock: C) -> Self {
        Self {
            sources,
            state,
            clock,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state(&self) -> &Arc<CalibrationState> {
        &self.state
    }

    pub fn source_ids(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.id().to_string()).collect()
    }

    /// One pass; returns the offset in effect afterwards.
    pub fn calibrate(&mut self) -> f64 {
        self.calibrate_detailed().offset_ms
    }

    pub fn calibrate_detailed(&mut self) -> CalibrationOutcome {
        let previous = self.state.offset_ms();
        let samples: Vec<TimeSample> = self
            .sources
            .iter_mut()
            .map(|src| sample_source(src.as_mut(), &self.clock, self.timeout))
            .collect();

        match select_offset(&samples) {
            Some(best) => {
                self.state.commit(best, self.clock.wall_ms());
                tracing::info!(
                    offset_ms = best,
                    previous_ms = previous,
                    ok = samples.iter().filter(|s| s.succeeded).count(),
                    total = samples.len(),
                    "calibrated"
                );
                CalibrationOutcome {
                    previous_offset_ms: previous,
                    offset_ms: best,
                    samples,
                    applied: true,
                }
            }
            None => {
                tracing::warn!(
                    offset_ms = previous,
                    total = samples.len(),
                    "calibration degraded; keeping previous offset"
                );
                CalibrationOutcome {
                    previous_offset_ms: previous,
                    offset_ms: previous,
                    samples,
                    applied: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(id: &str, offset: f64) -> TimeSample {
        TimeSample {
            source_id: id.into(),
            raw_offset_ms: offset,
            succeeded: true,
            round_trip_ms: 10.0,
            failure: None,
        }
    }

    #[test]
    fn smallest_magnitude_wins() {
        let s = [ok("a", 1500.0), ok("b", -200.0)];
        assert_eq!(select_offset(&s), Some(-200.0));
    }

    #[test]
    fn ties_prefer_first_source() {
        let s = [ok("a", -40.0), ok("b", 40.0)];
        assert_eq!(select_offset(&s), Some(-40.0));
    }

    #[test]
    fn failed_samples_are_ignored() {
        let s = [
            TimeSample::failed("a", 5.0, SourceFailureKind::Timeout),
            ok("b", 900.0),
        ];
        assert_eq!(select_offset(&s), Some(900.0));
        assert_eq!(select_offset(&s[..1]), None);
    }

    #[test]
    fn state_rejects_non_finite_commits() {
        let st = CalibrationState::new(12.0);
        assert!(!st.commit(f64::NAN, 0.0));
        assert!(!st.commit(f64::INFINITY, 0.0));
        assert_eq!(st.offset_ms(), 12.0);
        assert_eq!(st.last_updated_at(), None);
        assert!(st.commit(-3.5, 1_000.0));
        assert_eq!(st.offset_ms(), -3.5);
        assert_eq!(st.last_updated_at(), Some(1_000));
    }

    #[test]
    fn non_finite_initial_offset_starts_at_zero() {
        assert_eq!(CalibrationState::new(f64::NAN).offset_ms(), 0.0);
    }

    #[test]
    fn reschedule_threshold_is_inclusive() {
        let o = CalibrationOutcome {
            previous_offset_ms: 10.0,
            offset_ms: 15.0,
            samples: vec![],
            applied: true,
        };
        assert!(o.needs_reschedule(5.0));
        assert!(!o.needs_reschedule(5.5));
    }
}
