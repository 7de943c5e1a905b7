#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas, persisted user settings, and share-link encoding.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - `Settings` are the user preferences changed at runtime (UTC offset,
//!   12/24-hour mode, hidden controls, theme); see `settings`.
//! - `share` mirrors settings into URL query parameters.
use serde::Deserialize;

pub mod settings;
pub mod share;

pub use settings::{MemoryStore, Settings, SettingsFile, SettingsStore, sanitize_utc_offset};

/// Public time API used as the second calibration source by default.
pub const WORLD_TIME_API_URL: &str = "https://worldtimeapi.org/api/timezone/Etc/UTC";

/// Longest accepted recalibration interval.
const MAX_INTERVAL_MS: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayCfg {
    /// Signed UTC offset in hours; whole or half hours in [-12, 14].
    pub utc_offset_hours: f64,
    pub twelve_hour: bool,
    pub ui_hidden: bool,
    pub theme: String,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        let s = Settings::default();
        Self {
            utc_offset_hours: s.utc_offset_hours,
            twelve_hour: s.twelve_hour,
            ui_hidden: s.ui_hidden,
            theme: s.theme,
        }
    }
}

impl DisplayCfg {
    /// Settings seeded from the config file, sanitized.
    pub fn to_settings(&self) -> Settings {
        Settings {
            utc_offset_hours: self.utc_offset_hours,
            twelve_hour: self.twelve_hour,
            ui_hidden: self.ui_hidden,
            theme: self.theme.clone(),
        }
        .sanitized()
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CalibrationCfg {
    /// Periodic recalibration interval (ms).
    pub interval_ms: u64,
    /// Re-arm the aligned ticker only when the offset moved by at least this much.
    pub reschedule_threshold_ms: f64,
    /// Per-request timeout for each time source (ms). Also accepts alias "timeout_ms".
    #[serde(alias = "timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for CalibrationCfg {
    fn default() -> Self {
        Self {
            interval_ms: 5 * 60 * 1000,
            reschedule_threshold_ms: 5.0,
            request_timeout_ms: 5000,
        }
    }
}

/// `[sources]`: where calibration samples come from.
///
/// The default enables a single network source, the world time API. There
/// is no default origin: a terminal clock has no hosting page, so
/// `origin_url` must be set to calibrate against a second server. With one
/// source a failed request leaves the offset unchanged until the next pass.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourcesCfg {
    /// Hosting origin queried with HEAD for its `Date` header.
    pub origin_url: Option<String>,
    /// JSON endpoint exposing a `utc_datetime` field. An empty string disables it.
    pub world_time_url: Option<String>,
    /// Offline sources reporting local time shifted by these many ms.
    pub simulated_skew_ms: Vec<f64>,
}

impl Default for SourcesCfg {
    fn default() -> Self {
        Self {
            origin_url: None,
            world_time_url: Some(WORLD_TIME_API_URL.to_string()),
            simulated_skew_ms: Vec::new(),
        }
    }
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl SourcesCfg {
    pub fn origin(&self) -> Option<&str> {
        non_empty(&self.origin_url)
    }

    pub fn world_time(&self) -> Option<&str> {
        non_empty(&self.world_time_url)
    }

    pub fn count(&self) -> usize {
        usize::from(self.origin().is_some())
            + usize::from(self.world_time().is_some())
            + self.simulated_skew_ms.len()
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SettingsCfg {
    /// Where runtime preference changes are persisted.
    pub path: String,
}

impl Default for SettingsCfg {
    fn default() -> Self {
        Self {
            path: "clockwall_settings.toml".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub display: DisplayCfg,
    pub calibration: CalibrationCfg,
    pub sources: SourcesCfg,
    pub logging: Logging,
    pub settings: SettingsCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

fn check_http_url(key: &str, raw: &str) -> eyre::Result<()> {
    let parsed = url::Url::parse(raw).map_err(|e| eyre::eyre!("{key} is not a valid URL: {e}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        eyre::bail!("{key} must use http or https, got {}", parsed.scheme());
    }
    Ok(())
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Display
        let off = self.display.utc_offset_hours;
        let range = settings::MIN_UTC_OFFSET_HOURS..=settings::MAX_UTC_OFFSET_HOURS;
        if !off.is_finite() || !range.contains(&off) {
            eyre::bail!("display.utc_offset_hours must be in [-12, 14]");
        }
        if (off * 2.0).fract() != 0.0 {
            eyre::bail!("display.utc_offset_hours must be a whole or half hour");
        }
        if self.display.theme.trim().is_empty() {
            eyre::bail!("display.theme must not be empty");
        }

        // Calibration
        if self.calibration.interval_ms == 0 {
            eyre::bail!("calibration.interval_ms must be > 0");
        }
        if self.calibration.interval_ms > MAX_INTERVAL_MS {
            eyre::bail!("calibration.interval_ms is unreasonably large (>24h)");
        }
        let thr = self.calibration.reschedule_threshold_ms;
        if !thr.is_finite() || thr < 0.0 {
            eyre::bail!("calibration.reschedule_threshold_ms must be >= 0");
        }
        if self.calibration.request_timeout_ms == 0 {
            eyre::bail!("calibration.request_timeout_ms must be >= 1");
        }

        // Sources
        if self.sources.count() == 0 {
            eyre::bail!("sources: at least one time source must be configured");
        }
        if let Some(u) = self.sources.origin() {
            check_http_url("sources.origin_url", u)?;
        }
        if let Some(u) = self.sources.world_time() {
            check_http_url("sources.world_time_url", u)?;
        }
        if self.sources.simulated_skew_ms.iter().any(|s| !s.is_finite()) {
            eyre::bail!("sources.simulated_skew_ms entries must be finite");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Settings
        if self.settings.path.trim().is_empty() {
            eyre::bail!("settings.path must not be empty");
        }

        Ok(())
    }
}
