//! Forward-only hand rotation.

/// Degrees in a full turn.
pub const FULL_TURN_DEG: f64 = 360.0;

/// Advance an accumulated hand angle to the next preset orientation.
///
/// The hand always moves clockwise by the smallest non-negative amount, so
/// `result.rem_euclid(360) == next_deg`, `result >= prev_accumulated`, and an
/// already-aligned hand does not move. The accumulator grows without bound;
/// integer-valued angles stay exact in `f64` up to 2^53 degrees.
#[inline]
pub fn normalize(next_deg: u16, prev_accumulated: f64) -> f64 {
    let delta = (f64::from(next_deg) - prev_accumulated).rem_euclid(FULL_TURN_DEG);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    let delta = if delta >= FULL_TURN_DEG { 0.0 } else { delta };
    prev_accumulated + delta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_forward_to_target() {
        assert_eq!(normalize(90, 0.0), 90.0);
        assert_eq!(normalize(0, 90.0), 360.0);
        assert_eq!(normalize(270, 400.0), 630.0);
    }

    #[test]
    fn aligned_hand_stays_put() {
        assert_eq!(normalize(180, 540.0), 540.0);
        assert_eq!(normalize(0, 720.0), 720.0);
    }

    #[test]
    fn large_accumulators_stay_exact() {
        let prev = 360.0 * 1.0e12 + 135.0;
        let next = normalize(90, prev);
        assert_eq!(next - prev, 315.0);
        assert_eq!(next.rem_euclid(FULL_TURN_DEG), 90.0);
    }
}
