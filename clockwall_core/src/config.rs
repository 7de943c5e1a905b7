//! Runtime configuration for the calibration side of the clock.
//!
//! Separate from the TOML-deserialized config in `clockwall_config`; see
//! `conversions` for the bridge.

use std::time::Duration;

use crate::calibration::DEFAULT_REQUEST_TIMEOUT;

/// When and how strictly calibration runs.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationPolicy {
    /// Periodic recalibration interval. Default: 5 minutes.
    pub interval: Duration,
    /// Re-arm the aligned ticker when a pass moves the offset by at least this much (ms).
    pub reschedule_threshold_ms: f64,
    /// Per-source request timeout.
    pub request_timeout: Duration,
}

impl Default for CalibrationPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5 * 60),
            reschedule_threshold_ms: 5.0,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
