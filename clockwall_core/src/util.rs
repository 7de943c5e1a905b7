//! Common time helpers for clockwall_core.

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Convert fractional milliseconds to a `Duration`.
/// - Negative and NaN inputs clamp to zero.
/// - Rounded to the nearest nanosecond; values past `u64::MAX` ns saturate.
#[inline]
pub fn duration_from_ms(ms: f64) -> std::time::Duration {
    if ms.is_nan() || ms <= 0.0 {
        return std::time::Duration::ZERO;
    }
    let nanos = (ms * 1_000_000.0).round();
    if nanos >= u64::MAX as f64 {
        return std::time::Duration::MAX;
    }
    std::time::Duration::from_nanos(nanos as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn clamps_bad_input() {
        assert_eq!(duration_from_ms(-5.0), Duration::ZERO);
        assert_eq!(duration_from_ms(f64::NAN), Duration::ZERO);
        assert_eq!(duration_from_ms(f64::INFINITY), Duration::MAX);
    }

    #[test]
    fn keeps_sub_millisecond_precision() {
        assert_eq!(duration_from_ms(1.5), Duration::from_micros(1500));
    }
}
