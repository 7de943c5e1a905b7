//! `From` implementations bridging `clockwall_config` types to `clockwall_core` types.

use std::time::Duration;

use crate::config::CalibrationPolicy;
use crate::grid::TimeFormat;

// ── TimeFormat ───────────────────────────────────────────────────────────────

impl From<&clockwall_config::Settings> for TimeFormat {
    fn from(s: &clockwall_config::Settings) -> Self {
        Self {
            utc_offset_hours: s.utc_offset_hours,
            twelve_hour: s.twelve_hour,
        }
    }
}

impl From<&clockwall_config::DisplayCfg> for TimeFormat {
    fn from(c: &clockwall_config::DisplayCfg) -> Self {
        Self::from(&c.to_settings())
    }
}

// ── CalibrationPolicy ────────────────────────────────────────────────────────

impl From<&clockwall_config::CalibrationCfg> for CalibrationPolicy {
    fn from(c: &clockwall_config::CalibrationCfg) -> Self {
        Self {
            interval: Duration::from_millis(c.interval_ms),
            reschedule_threshold_ms: c.reschedule_threshold_ms,
            request_timeout: Duration::from_millis(c.request_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_cfg_is_sanitized_on_the_way_in() {
        let cfg = clockwall_config::DisplayCfg {
            utc_offset_hours: 5.4,
            twelve_hour: true,
            ..Default::default()
        };
        let f = TimeFormat::from(&cfg);
        assert_eq!(f.utc_offset_hours, 5.5);
        assert!(f.twelve_hour);
    }

    #[test]
    fn calibration_cfg_maps_to_policy() {
        let p = CalibrationPolicy::from(&clockwall_config::CalibrationCfg::default());
        assert_eq!(p, CalibrationPolicy::default());
    }
}
