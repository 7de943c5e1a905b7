//! Test and helper mocks for clockwall_core

use std::sync::{Arc, Mutex};
use std::time::Duration;

use clockwall_config::Settings;
use clockwall_traits::{Clock, TimeSource};

use crate::calibrator::{CalibrationReason, CalibrationTrigger};
use crate::grid::Frame;
use crate::runner::Display;

/// Shared, ordered record of side effects across several mocks.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        if let Ok(mut g) = self.0.lock() {
            g.push(entry.into());
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut g) = self.0.lock() {
            g.clear();
        }
    }
}

/// Time source that answers with the clock's wall time plus a fixed skew,
/// spending `latency` on the clock (a `ManualClock` advances instantly).
pub struct ScriptedSource<C: Clock> {
    id: String,
    clock: C,
    skew_ms: f64,
    latency: Duration,
}

impl<C: Clock> ScriptedSource<C> {
    pub fn new(id: impl Into<String>, clock: C, skew_ms: f64) -> Self {
        Self {
            id: id.into(),
            clock,
            skew_ms,
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

impl<C: Clock> TimeSource for ScriptedSource<C> {
    fn id(&self) -> &str {
        &self.id
    }

    fn fetch(&mut self, _timeout: Duration) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        let half = self.latency / 2;
        self.clock.sleep(half);
        let stamped = self.clock.wall_ms() + self.skew_ms;
        self.clock.sleep(self.latency - half);
        Ok(stamped)
    }
}

/// Time source that always fails with the given message.
pub struct FailingSource {
    id: String,
    message: &'static str,
}

impl FailingSource {
    pub fn new(id: impl Into<String>, message: &'static str) -> Self {
        Self {
            id: id.into(),
            message,
        }
    }
}

impl TimeSource for FailingSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn fetch(&mut self, _timeout: Duration) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other(self.message)))
    }
}

/// Display that keeps every presented frame.
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    frames: Arc<Mutex<Vec<(Frame, Settings)>>>,
    journal: Option<Journal>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also append `"render"` to `journal` on every frame.
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            frames: Arc::default(),
            journal: Some(journal),
        }
    }

    pub fn frames(&self) -> Vec<(Frame, Settings)> {
        self.frames.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn count(&self) -> usize {
        self.frames.lock().map(|g| g.len()).unwrap_or(0)
    }
}

impl Display for RecordingDisplay {
    fn present(&mut self, frame: &Frame, settings: &Settings) -> std::io::Result<()> {
        if let Some(j) = &self.journal {
            j.push("render");
        }
        self.frames
            .lock()
            .map_err(|_| std::io::Error::other("recording display poisoned"))?
            .push((frame.clone(), settings.clone()));
        Ok(())
    }
}

/// Display whose output is gone (e.g. a closed pipe).
pub struct BrokenDisplay;

impl Display for BrokenDisplay {
    fn present(&mut self, _frame: &Frame, _settings: &Settings) -> std::io::Result<()> {
        Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
    }
}

/// Trigger that records requests as `"calibrate:<reason>"` without running anything.
#[derive(Debug, Clone, Default)]
pub struct RecordingTrigger {
    journal: Journal,
    accept: bool,
}

impl RecordingTrigger {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            accept: true,
        }
    }

    /// A trigger whose worker has gone away.
    pub fn closed(journal: Journal) -> Self {
        Self {
            journal,
            accept: false,
        }
    }
}

impl CalibrationTrigger for RecordingTrigger {
    fn request(&self, reason: CalibrationReason) -> bool {
        self.journal.push(format!("calibrate:{reason}"));
        self.accept
    }
}
