//! Type-state builder for `ClockRunner`.
//!
//! `build()` is only available once a display is set; `try_build()` is always
//! available and reports what is missing.

use std::marker::PhantomData;
use std::sync::Arc;

use clockwall_config::{Settings, SettingsStore};
use clockwall_traits::{Clock, SystemClock};

use crate::calibration::CalibrationState;
use crate::calibrator::CalibrationTrigger;
use crate::config::CalibrationPolicy;
use crate::error::{BuildError, Result};
use crate::grid::RenderGrid;
use crate::runner::{ClockRunner, Display, RunStats};
use crate::scheduler::AlignedScheduler;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

pub struct ClockRunnerBuilder<D> {
    display: Option<Box<dyn Display>>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    state: Option<Arc<CalibrationState>>,
    settings: Option<Settings>,
    store: Option<Box<dyn SettingsStore>>,
    trigger: Option<Box<dyn CalibrationTrigger>>,
    policy: Option<CalibrationPolicy>,
    max_ticks: Option<u64>,
    _d: PhantomData<D>,
}

impl Default for ClockRunnerBuilder<Missing> {
    fn default() -> Self {
        Self {
            display: None,
            clock: None,
            state: None,
            settings: None,
            store: None,
            trigger: None,
            policy: None,
            max_ticks: None,
            _d: PhantomData,
        }
    }
}

impl ClockRunner {
    /// Start building a runner.
    pub fn builder() -> ClockRunnerBuilder<Missing> {
        ClockRunnerBuilder::default()
    }
}

impl<D> ClockRunnerBuilder<D> {
    /// Fallible build available in any type-state.
    pub fn try_build(self) -> Result<ClockRunner> {
        let display = self
            .display
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDisplay))?;
        let policy = self.policy.unwrap_or_default();
        if !policy.reschedule_threshold_ms.is_finite() || policy.reschedule_threshold_ms < 0.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "reschedule_threshold_ms must be finite and >= 0",
            )));
        }
        if policy.interval.is_zero() {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "calibration interval must be > 0",
            )));
        }

        Ok(ClockRunner {
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock::new())),
            state: self.state.unwrap_or_default(),
            grid: RenderGrid::new(),
            scheduler: AlignedScheduler::new(),
            display,
            settings: self.settings.unwrap_or_default().sanitized(),
            store: self.store,
            trigger: self.trigger,
            reschedule_threshold_ms: policy.reschedule_threshold_ms,
            max_ticks: self.max_ticks,
            visible: true,
            awaiting_startup: false,
            awaiting_resume: None,
            resume_seq: 0,
            stats: RunStats::default(),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Shared offset written by the calibration engine.
    pub fn with_state(mut self, state: Arc<CalibrationState>) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Persist settings changes through `store`.
    pub fn with_store(mut self, store: impl SettingsStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn with_trigger(mut self, trigger: impl CalibrationTrigger + 'static) -> Self {
        self.trigger = Some(Box::new(trigger));
        self
    }

    pub fn with_policy(mut self, policy: CalibrationPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Stop after this many ticks.
    pub fn with_max_ticks(mut self, max: u64) -> Self {
        self.max_ticks = Some(max);
        self
    }
}

impl ClockRunnerBuilder<Missing> {
    pub fn with_display(self, display: impl Display + 'static) -> ClockRunnerBuilder<Set> {
        ClockRunnerBuilder {
            display: Some(Box::new(display)),
            clock: self.clock,
            state: self.state,
            settings: self.settings,
            store: self.store,
            trigger: self.trigger,
            policy: self.policy,
            max_ticks: self.max_ticks,
            _d: PhantomData,
        }
    }
}

impl ClockRunnerBuilder<Set> {
    /// Validate and build. Only available once a display is set.
    pub fn build(self) -> Result<ClockRunner> {
        self.try_build()
    }
}
