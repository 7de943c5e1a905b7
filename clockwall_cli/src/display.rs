//! Terminal and JSON-lines presentation of rendered frames.

use std::io::Write;

use clockwall_config::Settings;
use clockwall_core::Display;
use clockwall_core::digits::{COLS, ROWS};
use clockwall_core::grid::{ClockCell, Frame, SEGMENTS};
use serde_json::json;

use crate::commands::HELP;

/// Box-drawing glyph for a face whose hands rest on a preset.
pub fn face_glyph(cell: &ClockCell) -> char {
    let h = cell.prev_hour_angle.rem_euclid(360.0) as u16;
    let m = cell.prev_minute_angle.rem_euclid(360.0) as u16;
    match (h.min(m), h.max(m)) {
        (0, 180) => '─',
        (90, 270) => '│',
        (180, 270) => '┘',
        (0, 270) => '└',
        (90, 180) => '┐',
        (0, 90) => '┌',
        (135, 135) => ' ',
        _ => '·',
    }
}

/// Text rows of the face grid, with a colon between the hour, minute and
/// second pairs.
pub fn grid_lines(frame: &Frame) -> Vec<String> {
    (0..ROWS)
        .map(|row| {
            let mut line = String::with_capacity(SEGMENTS * (COLS + 3));
            for (i, seg) in frame.segments.iter().enumerate() {
                for cell in &seg[row * COLS..(row + 1) * COLS] {
                    line.push(face_glyph(cell));
                }
                match i {
                    1 | 3 if row == 2 || row == 3 => line.push_str(" : "),
                    1 | 3 => line.push_str("   "),
                    5 => {}
                    _ => line.push(' '),
                }
            }
            line
        })
        .collect()
}

pub fn time_text(frame: &Frame) -> String {
    let d = frame.time.digits;
    let mut s = format!("{}{}:{}{}:{}{}", d[0], d[1], d[2], d[3], d[4], d[5]);
    if let Some(m) = frame.time.meridiem {
        s.push(' ');
        s.push_str(m.as_str());
    }
    s
}

fn format_offset(hours: f64) -> String {
    let sign = if hours < 0.0 { '-' } else { '+' };
    let abs = hours.abs();
    let whole = abs.trunc() as u32;
    if abs.fract() == 0.0 {
        format!("UTC{sign}{whole}")
    } else {
        format!("UTC{sign}{whole}:30")
    }
}

/// Redraws the grid in place on a terminal.
pub struct TerminalDisplay<W: Write> {
    out: W,
    ansi: bool,
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W, ansi: bool) -> Self {
        Self { out, ansi }
    }
}

impl<W: Write> Display for TerminalDisplay<W> {
    fn present(&mut self, frame: &Frame, settings: &Settings) -> std::io::Result<()> {
        if self.ansi {
            // Home + clear
            write!(self.out, "\x1b[H\x1b[2J")?;
        }
        for line in grid_lines(frame) {
            writeln!(self.out, "{line}")?;
        }
        writeln!(self.out)?;
        let meridiem = frame.time.meridiem.map(|m| m.as_str()).unwrap_or("");
        writeln!(self.out, "{meridiem:>2}")?;
        if !settings.ui_hidden {
            writeln!(
                self.out,
                "{}  {}  {}",
                format_offset(settings.utc_offset_hours),
                if settings.twelve_hour { "12h" } else { "24h" },
                settings.theme
            )?;
            writeln!(self.out, "{HELP}")?;
        }
        self.out.flush()
    }
}

/// One JSON object per frame.
pub struct JsonLinesDisplay<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

pub fn frame_json(frame: &Frame, settings: &Settings) -> serde_json::Value {
    let faces: Vec<Vec<[f64; 2]>> = frame
        .segments
        .iter()
        .map(|seg| {
            seg.iter()
                .map(|c| [c.prev_hour_angle, c.prev_minute_angle])
                .collect()
        })
        .collect();
    json!({
        "corrected_ms": frame.corrected_ms,
        "time": time_text(frame),
        "digits": frame.time.digits,
        "meridiem": frame.time.meridiem.map(|m| m.as_str()),
        "utc_offset_hours": settings.utc_offset_hours,
        "twelve_hour": settings.twelve_hour,
        "theme": settings.theme,
        "faces": faces,
    })
}

impl<W: Write> Display for JsonLinesDisplay<W> {
    fn present(&mut self, frame: &Frame, settings: &Settings) -> std::io::Result<()> {
        writeln!(self.out, "{}", frame_json(frame, settings))?;
        self.out.flush()
    }
}
