//! Corrected time → per-face hand angles.
//!
//! Six segments (H-tens, H-ones, M-tens, M-ones, S-tens, S-ones) each own 24
//! faces. Every render advances each face's accumulated hour and minute angles
//! forward to the target pattern for its digit.

use chrono::{DateTime, Timelike, Utc};

use crate::angle::normalize;
use crate::digits::{CELLS_PER_DIGIT, HandAngle, pattern};

/// Digit segments in the display.
pub const SEGMENTS: usize = 6;
/// Milliseconds per hour of UTC offset.
const MS_PER_HOUR: f64 = 3_600_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    pub fn as_str(self) -> &'static str {
        match self {
            Meridiem::Am => "AM",
            Meridiem::Pm => "PM",
        }
    }
}

impl std::fmt::Display for Meridiem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How corrected time is turned into displayed digits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeFormat {
    /// Signed offset from UTC in hours (whole or half).
    pub utc_offset_hours: f64,
    pub twelve_hour: bool,
}

impl Default for TimeFormat {
    fn default() -> Self {
        Self {
            utc_offset_hours: 0.0,
            twelve_hour: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeDigits {
    /// `[h_tens, h_ones, m_tens, m_ones, s_tens, s_ones]`
    pub digits: [u8; SEGMENTS],
    /// `None` in 24-hour mode.
    pub meridiem: Option<Meridiem>,
}

/// Split corrected time into six display digits.
pub fn time_digits(corrected_ms: f64, format: &TimeFormat) -> TimeDigits {
    let shifted = (corrected_ms + format.utc_offset_hours * MS_PER_HOUR).floor();
    // Non-finite or out-of-range input renders as the epoch rather than failing
    let dt = DateTime::<Utc>::from_timestamp_millis(shifted as i64).unwrap_or(DateTime::UNIX_EPOCH);

    let hour24 = dt.hour() as u8;
    let minute = dt.minute() as u8;
    let second = dt.second() as u8;

    let (hour, meridiem) = if format.twelve_hour {
        let folded = match hour24 % 12 {
            0 => 12,
            h => h,
        };
        let m = if hour24 < 12 { Meridiem::Am } else { Meridiem::Pm };
        (folded, Some(m))
    } else {
        (hour24, None)
    };

    TimeDigits {
        digits: [
            hour / 10,
            hour % 10,
            minute / 10,
            minute % 10,
            second / 10,
            second % 10,
        ],
        meridiem,
    }
}

/// Accumulated orientation of one face.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClockCell {
    pub prev_hour_angle: f64,
    pub prev_minute_angle: f64,
}

impl ClockCell {
    /// Rotate both hands forward onto `target`.
    #[inline]
    pub fn apply(&mut self, target: HandAngle) {
        self.prev_hour_angle = normalize(target.hour_deg, self.prev_hour_angle);
        self.prev_minute_angle = normalize(target.minute_deg, self.prev_minute_angle);
    }
}

/// The 24 faces drawing one digit.
#[derive(Debug, Clone, Default)]
pub struct Segment {
    cells: [ClockCell; CELLS_PER_DIGIT],
}

impl Segment {
    pub fn apply_digit(&mut self, digit: u8) {
        let pat = pattern(digit);
        for (cell, target) in self.cells.iter_mut().zip(pat.iter()) {
            cell.apply(*target);
        }
    }

    pub fn cells(&self) -> &[ClockCell; CELLS_PER_DIGIT] {
        &self.cells
    }
}

/// Snapshot of one render, ready for presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub corrected_ms: f64,
    pub time: TimeDigits,
    pub segments: [[ClockCell; CELLS_PER_DIGIT]; SEGMENTS],
}

/// All 144 faces. Created once; cells are mutated in place on every render.
#[derive(Debug, Clone, Default)]
pub struct RenderGrid {
    segments: [Segment; SEGMENTS],
    renders: u64,
}

impl RenderGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance every face to the digits for `corrected_ms` and snapshot the result.
    pub fn render(&mut self, corrected_ms: f64, format: &TimeFormat) -> Frame {
        let time = time_digits(corrected_ms, format);
        for (segment, digit) in self.segments.iter_mut().zip(time.digits) {
            segment.apply_digit(digit);
        }
        self.renders = self.renders.saturating_add(1);
        tracing::trace!(digits = ?time.digits, meridiem = ?time.meridiem, "grid rendered");
        Frame {
            corrected_ms,
            time,
            segments: std::array::from_fn(|i| *self.segments[i].cells()),
        }
    }

    pub fn renders(&self) -> u64 {
        self.renders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digits::DIGITS;

    // 2025-01-01T14:05:09Z
    const T_140509: f64 = 1_735_740_309_000.0;

    #[test]
    fn first_render_lands_on_pattern_angles() {
        let mut grid = RenderGrid::new();
        let frame = grid.render(T_140509, &TimeFormat::default());
        assert_eq!(frame.time.digits, [1, 4, 0, 5, 0, 9]);
        for (seg, digit) in frame.segments.iter().zip(frame.time.digits) {
            for (cell, target) in seg.iter().zip(DIGITS[digit as usize].iter()) {
                assert_eq!(cell.prev_hour_angle, f64::from(target.hour_deg));
                assert_eq!(cell.prev_minute_angle, f64::from(target.minute_deg));
            }
        }
    }

    #[test]
    fn rerender_of_same_second_does_not_move_hands() {
        let mut grid = RenderGrid::new();
        let a = grid.render(T_140509, &TimeFormat::default());
        let b = grid.render(T_140509 + 400.0, &TimeFormat::default());
        assert_eq!(a.segments, b.segments);
        assert_eq!(grid.renders(), 2);
    }

    #[test]
    fn hands_never_move_backwards_across_a_day() {
        let mut grid = RenderGrid::new();
        let mut prev = grid.render(T_140509, &TimeFormat::default());
        for step in 1..600 {
            let next = grid.render(T_140509 + f64::from(step) * 7_919.0, &TimeFormat::default());
            for (ps, ns) in prev.segments.iter().zip(next.segments.iter()) {
                for (p, n) in ps.iter().zip(ns.iter()) {
                    assert!(n.prev_hour_angle >= p.prev_hour_angle);
                    assert!(n.prev_minute_angle >= p.prev_minute_angle);
                }
            }
            prev = next;
        }
    }
}
