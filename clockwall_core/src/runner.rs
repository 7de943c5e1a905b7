//! Event-driven clock loop.
//!
//! One thread owns the grid, the scheduler and the display. It blocks on the
//! control channel with a timeout equal to the next tick deadline, so timer
//! ticks, user input and calibration outcomes are all handled in order on
//! the same timeline.

use std::sync::Arc;

use crossbeam_channel as xch;

use clockwall_config::settings::{MAX_UTC_OFFSET_HOURS, MIN_UTC_OFFSET_HOURS};
use clockwall_config::{Settings, SettingsStore, sanitize_utc_offset};
use clockwall_traits::Clock;

use crate::calibration::{CalibrationOutcome, CalibrationState};
use crate::calibrator::{CalibrationReason, CalibrationTrigger};
use crate::error::{ClockError, Result};
use crate::grid::{Frame, RenderGrid, TimeFormat};
use crate::scheduler::AlignedScheduler;

/// Presentation target for rendered frames.
pub trait Display {
    fn present(&mut self, frame: &Frame, settings: &Settings) -> std::io::Result<()>;
}

impl<D: Display + ?Sized> Display for Box<D> {
    fn present(&mut self, frame: &Frame, settings: &Settings) -> std::io::Result<()> {
        (**self).present(frame, settings)
    }
}

/// Inputs to the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlEvent {
    /// Page/terminal visibility changed.
    Visibility(bool),
    SetUtcOffset(f64),
    SetTwelveHour(bool),
    ToggleTwelveHour,
    SetUiHidden(bool),
    SetTheme(String),
    /// Ask for an out-of-schedule calibration pass.
    Recalibrate,
    Calibrated(CalibrationOutcome, CalibrationReason),
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub ticks: u64,
    pub missed_ticks: u64,
    pub renders: u64,
    pub rearms: u64,
    pub calibrations: u64,
    pub degraded_calibrations: u64,
    pub last_offset_ms: f64,
}

pub struct ClockRunner {
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) state: Arc<CalibrationState>,
    pub(crate) grid: RenderGrid,
    pub(crate) scheduler: AlignedScheduler,
    pub(crate) display: Box<dyn Display>,
    pub(crate) settings: Settings,
    pub(crate) store: Option<Box<dyn SettingsStore>>,
    pub(crate) trigger: Option<Box<dyn CalibrationTrigger>>,
    pub(crate) reschedule_threshold_ms: f64,
    pub(crate) max_ticks: Option<u64>,
    pub(crate) visible: bool,
    pub(crate) awaiting_startup: bool,
    /// Sequence of the resume whose calibration outcome will re-arm the ticker.
    pub(crate) awaiting_resume: Option<u64>,
    pub(crate) resume_seq: u64,
    pub(crate) stats: RunStats,
}

impl core::fmt::Debug for ClockRunner {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClockRunner")
            .field("settings", &self.settings)
            .field("visible", &self.visible)
            .field("phase", &self.scheduler.phase())
            .field("offset_ms", &self.state.offset_ms())
            .finish()
    }
}

impl ClockRunner {
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn scheduler(&self) -> &AlignedScheduler {
        &self.scheduler
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn corrected_now_ms(&self) -> f64 {
        self.state.corrected_now_ms(&self.clock)
    }

    /// Startup sequence: calibrate, then render, then arm.
    ///
    /// With a calibration worker the render waits for the startup outcome;
    /// without one the clock starts immediately on the current offset.
    pub fn start(&mut self) -> Result<()> {
        if self.request(CalibrationReason::Startup) {
            self.awaiting_startup = true;
            return Ok(());
        }
        if self.visible {
            self.render_now()?;
            self.arm();
        }
        Ok(())
    }

    /// Render the current corrected time and present it.
    pub fn render_now(&mut self) -> Result<Frame> {
        let format = TimeFormat::from(&self.settings);
        let frame = self.grid.render(self.corrected_now_ms(), &format);
        self.display
            .present(&frame, &self.settings)
            .map_err(|e| eyre::Report::new(ClockError::Display(e.to_string())))?;
        self.stats.renders += 1;
        Ok(frame)
    }

    fn arm(&mut self) {
        let now = self.clock.now();
        let corrected = self.corrected_now_ms();
        self.scheduler.arm(now, corrected);
        self.stats.rearms += 1;
    }

    fn request(&mut self, reason: CalibrationReason) -> bool {
        match &self.trigger {
            Some(t) if t.request(reason) => true,
            Some(_) => {
                tracing::warn!(reason = %reason, "calibration worker unavailable");
                self.trigger = None;
                false
            }
            None => false,
        }
    }

    fn persist(&mut self) {
        if let Some(store) = self.store.as_mut()
            && let Err(e) = store.save(&self.settings)
        {
            tracing::warn!(error = %e, "failed to persist settings");
        }
    }

    /// Render and re-align after a user-visible format change.
    fn refresh(&mut self) -> Result<()> {
        if self.visible && !self.awaiting_startup {
            self.render_now()?;
            self.arm();
        }
        Ok(())
    }

    /// Fire the scheduler if a deadline passed.
    pub fn on_timer(&mut self) -> Result<Flow> {
        let Some(tick) = self.scheduler.poll(self.clock.now()) else {
            return Ok(Flow::Continue);
        };
        self.render_now()?;
        self.stats.ticks += 1;
        self.stats.missed_ticks += tick.missed;
        tracing::trace!(seq = tick.seq, generation = tick.generation, "tick");
        if self.max_ticks.is_some_and(|max| self.stats.ticks >= max) {
            tracing::debug!(ticks = self.stats.ticks, "tick limit reached");
            return Ok(Flow::Stop);
        }
        Ok(Flow::Continue)
    }

    pub fn handle(&mut self, event: ControlEvent) -> Result<Flow> {
        match event {
            ControlEvent::Visibility(false) => {
                if self.visible {
                    tracing::debug!("hidden; ticker stopped");
                }
                self.visible = false;
                self.awaiting_resume = None;
                self.scheduler.stop();
            }
            ControlEvent::Visibility(true) => {
                if self.visible {
                    return Ok(Flow::Continue);
                }
                self.visible = true;
                if self.awaiting_startup {
                    // Startup outcome still pending; it renders and arms.
                    return Ok(Flow::Continue);
                }
                tracing::debug!("visible again; resuming");
                self.render_now()?;
                self.resume_seq += 1;
                let seq = self.resume_seq;
                if self.request(CalibrationReason::Resume(seq)) {
                    self.awaiting_resume = Some(seq);
                } else {
                    self.arm();
                }
            }
            ControlEvent::SetUtcOffset(hours) => {
                if !hours.is_finite() || !(MIN_UTC_OFFSET_HOURS..=MAX_UTC_OFFSET_HOURS).contains(&hours)
                {
                    tracing::warn!(hours, "ignoring out-of-range UTC offset");
                    return Ok(Flow::Continue);
                }
                self.settings.utc_offset_hours = sanitize_utc_offset(hours);
                self.persist();
                self.refresh()?;
            }
            ControlEvent::SetTwelveHour(on) => {
                self.settings.twelve_hour = on;
                self.persist();
                self.refresh()?;
            }
            ControlEvent::ToggleTwelveHour => {
                self.settings.twelve_hour = !self.settings.twelve_hour;
                self.persist();
                self.refresh()?;
            }
            ControlEvent::SetUiHidden(hidden) => {
                self.settings.ui_hidden = hidden;
                self.persist();
            }
            ControlEvent::SetTheme(theme) => {
                let theme = theme.trim();
                if theme.is_empty() {
                    return Ok(Flow::Continue);
                }
                self.settings.theme = theme.to_string();
                self.persist();
            }
            ControlEvent::Recalibrate => {
                if !self.request(CalibrationReason::Manual) {
                    tracing::info!("no calibration worker; manual recalibration skipped");
                }
            }
            ControlEvent::Calibrated(outcome, reason) => self.on_calibrated(&outcome, reason)?,
            ControlEvent::Shutdown => return Ok(Flow::Stop),
        }
        Ok(Flow::Continue)
    }

    fn on_calibrated(&mut self, outcome: &CalibrationOutcome, reason: CalibrationReason) -> Result<()> {
        self.stats.calibrations += 1;
        if !outcome.applied {
            self.stats.degraded_calibrations += 1;
        }
        self.stats.last_offset_ms = outcome.offset_ms;

        match reason {
            CalibrationReason::Startup if self.awaiting_startup => {
                self.awaiting_startup = false;
                if self.visible {
                    self.render_now()?;
                    self.arm();
                }
            }
            CalibrationReason::Resume(seq) if self.awaiting_resume == Some(seq) => {
                // Re-arm whether or not the pass succeeded
                self.awaiting_resume = None;
                if self.visible {
                    self.arm();
                }
            }
            _ => {
                // While a resume pass is pending only its outcome may arm
                if self.visible
                    && !self.awaiting_startup
                    && self.awaiting_resume.is_none()
                    && outcome.needs_reschedule(self.reschedule_threshold_ms)
                {
                    tracing::info!(
                        reason = %reason,
                        drift_ms = outcome.drift_ms(),
                        "offset drifted; re-aligning ticker"
                    );
                    self.arm();
                }
            }
        }
        Ok(())
    }

    /// Drive the loop until `Shutdown`, the tick limit, or the control
    /// channel closing while no ticker is running.
    ///
    /// After the channel closes the loop keeps ticking by sleeping on the
    /// clock, which lets a `ManualClock` run scripted sessions instantly.
    pub fn run(mut self, events: &xch::Receiver<ControlEvent>) -> Result<RunStats> {
        self.start()?;
        let mut events_open = true;
        loop {
            if self.on_timer()? == Flow::Stop {
                break;
            }
            let wait = self.scheduler.time_until_due(self.clock.now());

            if !events_open {
                match wait {
                    Some(d) => {
                        self.clock.sleep(d);
                        continue;
                    }
                    None => break,
                }
            }

            let received = match wait {
                Some(d) => events.recv_timeout(d),
                None => events
                    .recv()
                    .map_err(|_| xch::RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(event) => {
                    if self.handle(event)? == Flow::Stop {
                        break;
                    }
                }
                Err(xch::RecvTimeoutError::Timeout) => {}
                Err(xch::RecvTimeoutError::Disconnected) => {
                    tracing::debug!("control channel closed");
                    events_open = false;
                }
            }
        }
        self.scheduler.stop();
        tracing::info!(
            ticks = self.stats.ticks,
            renders = self.stats.renders,
            calibrations = self.stats.calibrations,
            "clock stopped"
        );
        Ok(self.stats)
    }
}
