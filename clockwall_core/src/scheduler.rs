//! Second-aligned tick scheduling.
//!
//! Arming computes a one-shot delay to the next whole corrected second, then
//! ticks on a fixed period. The scheduler owns no thread: the runner asks how
//! long to wait (`time_until_due`) and polls it afterwards, so timers exist
//! only as deadlines and re-arming can never leave a stale timer behind.

use std::time::{Duration, Instant};

use crate::util::{MILLIS_PER_SEC, duration_from_ms};

/// Fixed period between ticks once aligned.
pub const TICK_PERIOD: Duration = Duration::from_millis(MILLIS_PER_SEC);
const PERIOD_MS: f64 = MILLIS_PER_SEC as f64;

/// Delay from `corrected_now_ms` to the next whole second, in `(0, 1000]`.
///
/// Exactly on a boundary yields a full period rather than zero.
pub fn first_delay_ms(corrected_now_ms: f64) -> f64 {
    if !corrected_now_ms.is_finite() {
        return PERIOD_MS;
    }
    let mut into = corrected_now_ms.rem_euclid(PERIOD_MS);
    // rem_euclid of a tiny negative value can round up to the modulus
    if into >= PERIOD_MS {
        into = 0.0;
    }
    PERIOD_MS - into
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stopped,
    /// One-shot wait for the first second boundary.
    Aligning { due: Instant },
    /// Recurring ticks.
    Ticking { next: Instant },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Generation of the arm that produced this tick.
    pub generation: u64,
    /// Ticks since that arm, starting at 0 for the aligned one.
    pub seq: u64,
    /// Whole periods skipped because the caller polled late.
    pub missed: u64,
}

impl Tick {
    pub fn is_aligned(&self) -> bool {
        self.seq == 0
    }
}

#[derive(Debug, Clone)]
pub struct AlignedScheduler {
    phase: Phase,
    generation: u64,
    seq: u64,
}

impl Default for AlignedScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl AlignedScheduler {
    pub fn new() -> Self {
        Self {
            phase: Phase::Stopped,
            generation: 0,
            seq: 0,
        }
    }

    /// Cancel any pending timer and align to the next second of corrected time.
    ///
    /// Returns the one-shot delay.
    pub fn arm(&mut self, now: Instant, corrected_now_ms: f64) -> Duration {
        let delay = duration_from_ms(first_delay_ms(corrected_now_ms));
        self.generation = self.generation.wrapping_add(1);
        self.seq = 0;
        self.phase = Phase::Aligning { due: now + delay };
        tracing::debug!(
            generation = self.generation,
            delay_ms = delay.as_secs_f64() * 1000.0,
            "ticker armed"
        );
        delay
    }

    /// Cancel both timers.
    pub fn stop(&mut self) {
        if self.phase != Phase::Stopped {
            self.generation = self.generation.wrapping_add(1);
            self.phase = Phase::Stopped;
            tracing::debug!(generation = self.generation, "ticker stopped");
        }
    }

    /// Fire at most one tick if a deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<Tick> {
        match self.phase {
            Phase::Stopped => None,
            Phase::Aligning { due } => {
                if now < due {
                    return None;
                }
                let (next, missed) = advance_past(due + TICK_PERIOD, now);
                self.phase = Phase::Ticking { next };
                Some(self.emit(missed))
            }
            Phase::Ticking { next } => {
                if now < next {
                    return None;
                }
                let (next, missed) = advance_past(next + TICK_PERIOD, now);
                self.phase = Phase::Ticking { next };
                Some(self.emit(missed))
            }
        }
    }

    fn emit(&mut self, missed: u64) -> Tick {
        let tick = Tick {
            generation: self.generation,
            seq: self.seq,
            missed,
        };
        self.seq = self.seq.saturating_add(1);
        if missed > 0 {
            tracing::debug!(missed, "ticker fell behind; coalesced");
        }
        tick
    }

    /// Time left before the next deadline, `None` when stopped.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        match self.phase {
            Phase::Stopped => None,
            Phase::Aligning { due } => Some(due.saturating_duration_since(now)),
            Phase::Ticking { next } => Some(next.saturating_duration_since(now)),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_running(&self) -> bool {
        self.phase != Phase::Stopped
    }
}

/// Move `next` forward by whole periods until it lies after `now`.
fn advance_past(mut next: Instant, now: Instant) -> (Instant, u64) {
    let mut missed = 0;
    if next <= now {
        let behind = now.saturating_duration_since(next);
        let periods = (behind.as_nanos() / TICK_PERIOD.as_nanos()) as u64 + 1;
        missed = periods;
        next += TICK_PERIOD * periods.min(u64::from(u32::MAX)) as u32;
    }
    (next, missed)
}
