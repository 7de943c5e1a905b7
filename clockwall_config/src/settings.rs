//! Persisted user preferences and the stores that hold them.
//!
//! Settings are read once at startup and written whenever they change.
//! Reading never fails hard: a missing or unreadable file yields defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::{fs, io::Write};

pub const DEFAULT_UTC_OFFSET_HOURS: f64 = 7.0;
pub const MIN_UTC_OFFSET_HOURS: f64 = -12.0;
pub const MAX_UTC_OFFSET_HOURS: f64 = 14.0;
pub const DEFAULT_THEME: &str = "Black";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub utc_offset_hours: f64,
    pub twelve_hour: bool,
    pub ui_hidden: bool,
    pub theme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            twelve_hour: false,
            ui_hidden: false,
            theme: DEFAULT_THEME.to_string(),
        }
    }
}

/// Clamp a configured UTC offset to something renderable.
///
/// Non-finite or out-of-range values fall back to the default; anything else
/// is snapped to the nearest half hour.
pub fn sanitize_utc_offset(hours: f64) -> f64 {
    if !hours.is_finite() || !(MIN_UTC_OFFSET_HOURS..=MAX_UTC_OFFSET_HOURS).contains(&hours) {
        return DEFAULT_UTC_OFFSET_HOURS;
    }
    (hours * 2.0).round() / 2.0
}

impl Settings {
    pub fn sanitized(mut self) -> Self {
        self.utc_offset_hours = sanitize_utc_offset(self.utc_offset_hours);
        let theme = self.theme.trim();
        self.theme = if theme.is_empty() {
            DEFAULT_THEME.to_string()
        } else {
            theme.to_string()
        };
        self
    }
}

/// Read-at-startup / write-on-change hook for settings.
pub trait SettingsStore {
    /// `Ok(None)` when nothing has been persisted yet.
    fn load(&self) -> eyre::Result<Option<Settings>>;
    fn save(&mut self, settings: &Settings) -> eyre::Result<()>;
}

/// Write `bytes` to a sibling temp file, then rename over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("new");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}

/// TOML file store.
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load persisted settings, falling back to `fallback` when the file is
    /// missing or unreadable.
    pub fn load_or(&self, fallback: Settings) -> Settings {
        match self.load() {
            Ok(Some(s)) => s,
            Ok(None) => fallback,
            Err(e) => {
                tracing::warn!(path = ?self.path, error = %e, "ignoring unreadable settings file");
                fallback
            }
        }
    }
}

impl SettingsStore for SettingsFile {
    fn load(&self) -> eyre::Result<Option<Settings>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)
            .map_err(|e| eyre::eyre!("read settings {:?}: {}", self.path, e))?;
        let s: Settings = toml::from_str(&text)
            .map_err(|e| eyre::eyre!("parse settings {:?}: {}", self.path, e))?;
        Ok(Some(s.sanitized()))
    }

    fn save(&mut self, settings: &Settings) -> eyre::Result<()> {
        let text = toml::to_string(settings)?;
        write_atomic(&self.path, text.as_bytes())
            .map_err(|e| eyre::eyre!("write settings {:?}: {}", self.path, e))
    }
}

/// In-memory store; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<(Option<Settings>, usize)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(settings: Settings) -> Self {
        Self {
            inner: Arc::new(Mutex::new((Some(settings), 0))),
        }
    }

    /// Last saved (or seeded) settings.
    pub fn current(&self) -> Option<Settings> {
        self.inner.lock().ok().and_then(|g| g.0.clone())
    }

    /// Number of `save` calls so far.
    pub fn writes(&self) -> usize {
        self.inner.lock().map(|g| g.1).unwrap_or(0)
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> eyre::Result<Option<Settings>> {
        Ok(self.current())
    }

    fn save(&mut self, settings: &Settings) -> eyre::Result<()> {
        let mut g = self
            .inner
            .lock()
            .map_err(|_| eyre::eyre!("settings store poisoned"))?;
        g.0 = Some(settings.clone());
        g.1 += 1;
        Ok(())
    }
}
