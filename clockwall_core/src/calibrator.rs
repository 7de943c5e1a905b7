//! Background calibration thread.
//!
//! Owns the `CalibrationEngine` so network waits never block rendering.
//! Passes run on request (startup, resume, manual) and on a fixed interval;
//! each outcome is reported to the runner as a `ControlEvent::Calibrated`.
//!
//! Each `Calibrator` spawns exactly one thread, which is shut down and
//! joined when the `Calibrator` is dropped.
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use clockwall_traits::Clock;

use crate::calibration::CalibrationEngine;
use crate::runner::ControlEvent;

/// Why a calibration pass ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationReason {
    Startup,
    /// Carries the runner's resume sequence so a late outcome from an earlier
    /// resume is not mistaken for the current one.
    Resume(u64),
    Periodic,
    Manual,
}

impl CalibrationReason {
    pub fn as_str(self) -> &'static str {
        match self {
            CalibrationReason::Startup => "startup",
            CalibrationReason::Resume(_) => "resume",
            CalibrationReason::Periodic => "periodic",
            CalibrationReason::Manual => "manual",
        }
    }
}

impl std::fmt::Display for CalibrationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something the runner can ask for a calibration pass.
///
/// Returns false when the request could not be queued (worker gone).
pub trait CalibrationTrigger {
    fn request(&self, reason: CalibrationReason) -> bool;
}

pub struct Calibrator {
    requests: Option<xch::Sender<CalibrationReason>>,
    passes: Arc<AtomicU64>,
    /// Shutdown flag checked between passes
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Calibrator {
    /// Spawn the worker. `interval` drives periodic passes; requested passes do
    /// not move the periodic schedule.
    pub fn spawn<C: Clock + Send + 'static>(
        mut engine: CalibrationEngine<C>,
        interval: Duration,
        events: xch::Sender<ControlEvent>,
    ) -> Self {
        let (req_tx, req_rx) = xch::unbounded::<CalibrationReason>();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let passes = Arc::new(AtomicU64::new(0));
        let passes_clone = passes.clone();
        let interval = interval.max(Duration::from_millis(1));

        let join_handle = std::thread::spawn(move || {
            let mut next_periodic = Instant::now() + interval;
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("calibrator received shutdown signal");
                    break;
                }

                let reason = match req_rx.recv_deadline(next_periodic) {
                    Ok(reason) => reason,
                    Err(xch::RecvTimeoutError::Timeout) => {
                        next_periodic += interval;
                        // Don't replay passes missed while a slow pass ran
                        let now = Instant::now();
                        if next_periodic <= now {
                            next_periodic = now + interval;
                        }
                        CalibrationReason::Periodic
                    }
                    Err(xch::RecvTimeoutError::Disconnected) => break,
                };

                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }

                let outcome = engine.calibrate_detailed();
                passes_clone.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    reason = %reason,
                    drift_ms = outcome.drift_ms(),
                    applied = outcome.applied,
                    "calibration pass done"
                );
                if events.send(ControlEvent::Calibrated(outcome, reason)).is_err() {
                    tracing::debug!("calibration consumer disconnected, exiting thread");
                    break;
                }
            }
            tracing::trace!("calibrator thread exiting cleanly");
        });

        Self {
            requests: Some(req_tx),
            passes,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Completed passes so far.
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::Relaxed)
    }
}

impl CalibrationTrigger for Calibrator {
    fn request(&self, reason: CalibrationReason) -> bool {
        self.requests
            .as_ref()
            .is_some_and(|tx| tx.send(reason).is_ok())
    }
}

impl Drop for Calibrator {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // Disconnecting the request channel wakes the worker out of its wait.
        // A pass already in flight finishes first (bounded by the request timeout).
        drop(self.requests.take());
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("calibrator thread joined"),
                Err(e) => tracing::warn!(?e, "calibrator thread panicked during shutdown"),
            }
        }
    }
}
