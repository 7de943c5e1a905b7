//! Digit shapes drawn with clock hands.
//!
//! Each digit is a 4-column × 6-row grid of faces, row-major. Every face shows
//! one of seven hand presets. Angles are screen-space, clockwise from "pointing
//! right": 0 = right, 90 = down, 180 = left, 270 = up.

/// Columns per digit.
pub const COLS: usize = 4;
/// Rows per digit.
pub const ROWS: usize = 6;
/// Faces per digit.
pub const CELLS_PER_DIGIT: usize = COLS * ROWS;

/// Target orientation for one face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandAngle {
    pub hour_deg: u16,
    pub minute_deg: u16,
}

impl HandAngle {
    pub const fn new(hour_deg: u16, minute_deg: u16) -> Self {
        Self {
            hour_deg,
            minute_deg,
        }
    }
}

/// Horizontal stroke.
pub const H: HandAngle = HandAngle::new(0, 180);
/// Vertical stroke.
pub const V: HandAngle = HandAngle::new(270, 90);
/// Corner joining left and up.
pub const TL: HandAngle = HandAngle::new(180, 270);
/// Corner joining right and up.
pub const TR: HandAngle = HandAngle::new(0, 270);
/// Corner joining left and down.
pub const BL: HandAngle = HandAngle::new(180, 90);
/// Corner joining right and down.
pub const BR: HandAngle = HandAngle::new(0, 90);
/// Blank face: both hands parked diagonally.
pub const E: HandAngle = HandAngle::new(135, 135);

/// The only orientations a digit may use.
pub const PRESETS: [HandAngle; 7] = [H, V, TL, TR, BL, BR, E];

pub type DigitPattern = [HandAngle; CELLS_PER_DIGIT];

#[rustfmt::skip]
pub static DIGITS: [DigitPattern; 10] = [
    // 0
    [
        BR, H,  H,  BL,
        V,  BR, BL, V,
        V,  V,  V,  V,
        V,  V,  V,  V,
        V,  TR, TL, V,
        TR, H,  H,  TL,
    ],
    // 1
    [
        BR, H,  BL, E,
        TR, BL, V,  E,
        E,  V,  V,  E,
        E,  V,  V,  E,
        BR, TL, TR, BL,
        TR, H,  H,  TL,
    ],
    // 2
    [
        BR, H,  H,  BL,
        TR, H,  BL, V,
        BR, H,  TL, V,
        V,  BR, H,  TL,
        V,  TR, H,  BL,
        TR, H,  H,  TL,
    ],
    // 3
    [
        BR, H,  H,  BL,
        TR, H,  BL, V,
        E,  BR, TL, V,
        E,  TR, BL, V,
        BR, H,  TL, V,
        TR, H,  H,  TL,
    ],
    // 4
    [
        BR, BL, BR, BL,
        V,  V,  V,  V,
        V,  TR, TL, V,
        TR, H,  BL, V,
        E,  E,  V,  V,
        E,  E,  TR, TL,
    ],
    // 5
    [
        BR, H,  H,  BL,
        V,  BR, H,  TL,
        V,  TR, H,  BL,
        TR, H,  BL, V,
        BR, H,  TL, V,
        TR, H,  H,  TL,
    ],
    // 6
    [
        BR, H,  H,  BL,
        V,  BR, H,  TL,
        V,  TR, H,  BL,
        V,  BR, BL, V,
        V,  TR, TL, V,
        TR, H,  H,  TL,
    ],
    // 7
    [
        BR, H,  H,  BL,
        TR, H,  BL, V,
        E,  E,  V,  V,
        E,  E,  V,  V,
        E,  E,  V,  V,
        E,  E,  TR, TL,
    ],
    // 8
    [
        BR, H,  H,  BL,
        V,  BR, BL, V,
        V,  TR, TL, V,
        V,  BR, BL, V,
        V,  TR, TL, V,
        TR, H,  H,  TL,
    ],
    // 9
    [
        BR, H,  H,  BL,
        V,  BR, BL, V,
        V,  TR, TL, V,
        TR, H,  BL, V,
        BR, H,  TL, V,
        TR, H,  H,  TL,
    ],
];

/// Pattern for a decimal digit. Values above 9 are clamped to 9.
#[inline]
pub fn pattern(digit: u8) -> &'static DigitPattern {
    &DIGITS[usize::from(digit.min(9))]
}
