//! RS-274X outline reader.
//!
//! Only what the bounding box needs is interpreted: the coordinate format,
//! units, and the X/Y words of draw/move/flash operations. Every point the
//! plotter visits counts, moves included. Apertures,
//! macros and attributes are skipped. Arc offsets (`I`/`J`) are ignored, so
//! an arc contributes its endpoints only; outline corner arcs never extend
//! past their endpoints.

use super::{Bounds, OutlineError, OutlineProvider};
use crate::debug;
use crate::geometry::BoardGeometry;
use std::fs;
use std::path::PathBuf;

const MM_PER_INCH: f64 = 25.4;

/// Outline read from a Gerber file on disk.
#[derive(Debug, Clone)]
pub struct GerberOutline {
    path: PathBuf,
}

impl GerberOutline {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutlineProvider for GerberOutline {
    fn board_geometry(&self) -> Result<BoardGeometry, OutlineError> {
        let bytes = fs::read(&self.path).map_err(|e| OutlineError::Io(self.path.clone(), e))?;
        let text = String::from_utf8_lossy(&bytes);
        let bounds = scan_bounds(&text)?;
        debug!("outline"; "bounds x [{}, {}] y [{}, {}]",
            bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y);
        bounds.to_geometry()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Units {
    Millimeters,
    Inches,
}

impl Units {
    fn to_mm(self, value: f64) -> f64 {
        match self {
            Self::Millimeters => value,
            Self::Inches => value * MM_PER_INCH,
        }
    }
}

/// `%FS...%` coordinate format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Format {
    integer: usize,
    decimal: usize,
    trailing_zeros: bool,
    incremental: bool,
}

impl Format {
    /// Parse the body of an `FS` statement, e.g. `LAX46Y46`.
    fn parse(spec: &str) -> Option<Self> {
        let bytes = spec.as_bytes();
        let trailing_zeros = match bytes.first()? {
            b'L' => false,
            b'T' => true,
            _ => return None,
        };
        let incremental = match bytes.get(1)? {
            b'A' => false,
            b'I' => true,
            _ => return None,
        };
        let x = spec.find('X')?;
        let digits = spec.get(x + 1..x + 3)?.as_bytes();
        if !digits.iter().all(u8::is_ascii_digit) {
            return None;
        }
        Some(Self {
            integer: usize::from(digits[0] - b'0'),
            decimal: usize::from(digits[1] - b'0'),
            trailing_zeros,
            incremental,
        })
    }

    /// Decode a coordinate number into file units.
    fn decode(&self, raw: &str) -> Option<f64> {
        if raw.contains('.') {
            return raw.parse().ok();
        }
        let (negative, digits) = match raw.as_bytes().first()? {
            b'-' => (true, &raw[1..]),
            b'+' => (false, &raw[1..]),
            _ => (false, raw),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let scaled = if self.trailing_zeros {
            let width = self.integer + self.decimal;
            let padded = format!("{digits:0<width$}");
            padded.parse::<f64>().ok()?
        } else {
            digits.parse::<f64>().ok()?
        };
        let value = scaled / 10f64.powi(self.decimal as i32);
        Some(if negative { -value } else { value })
    }
}

/// Interpreter state while walking the command stream.
struct Scanner {
    format: Option<Format>,
    units: Units,
    x: f64,
    y: f64,
    operation: Option<u32>,
    bounds: Option<Bounds>,
}

impl Scanner {
    fn new() -> Self {
        Self {
            format: None,
            units: Units::Millimeters,
            x: 0.0,
            y: 0.0,
            operation: None,
            bounds: None,
        }
    }

    fn include(&mut self, x: f64, y: f64) {
        match &mut self.bounds {
            Some(bounds) => bounds.include(x, y),
            None => self.bounds = Some(Bounds::point(x, y)),
        }
    }

    /// Handle the first command of a `%...%` block.
    fn extended(&mut self, index: usize, command: &str) -> Result<(), OutlineError> {
        if let Some(spec) = command.strip_prefix("FS") {
            let format = Format::parse(spec).ok_or_else(|| OutlineError::Parse {
                index,
                message: format!("bad format statement `{command}`"),
            })?;
            self.format = Some(format);
        } else if command == "MOMM" {
            self.units = Units::Millimeters;
        } else if command == "MOIN" {
            self.units = Units::Inches;
        }
        Ok(())
    }

    fn data_block(&mut self, index: usize, block: &str) -> Result<(), OutlineError> {
        let bad = |message: String| OutlineError::Parse { index, message };

        if block.starts_with("G04") || block.starts_with('M') {
            return Ok(());
        }

        let mut rest = block;
        while let Some(code) = rest.strip_prefix('G') {
            let len = code.bytes().take_while(u8::is_ascii_digit).count();
            let number: u32 = code[..len]
                .parse()
                .map_err(|_| bad(format!("bad G code in `{block}`")))?;
            match number {
                70 => self.units = Units::Inches,
                71 => self.units = Units::Millimeters,
                90 | 91 => {
                    if let Some(format) = &mut self.format {
                        format.incremental = number == 91;
                    }
                }
                _ => {}
            }
            rest = &code[len..];
        }

        let mut x = None;
        let mut y = None;
        let mut d = None;
        while let Some(letter) = rest.chars().next() {
            let body = &rest[letter.len_utf8()..];
            let len = body
                .bytes()
                .take_while(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.'))
                .count();
            let raw = &body[..len];
            rest = &body[len..];

            match letter {
                'X' | 'Y' => {
                    let format = self
                        .format
                        .ok_or_else(|| bad("coordinate before format statement".into()))?;
                    let value = format
                        .decode(raw)
                        .ok_or_else(|| bad(format!("bad coordinate `{letter}{raw}`")))?;
                    if letter == 'X' {
                        x = Some(value);
                    } else {
                        y = Some(value);
                    }
                }
                'I' | 'J' => {}
                'D' => {
                    let code = raw
                        .parse::<u32>()
                        .map_err(|_| bad(format!("bad D code `D{raw}`")))?;
                    d = Some(code);
                }
                other => return Err(bad(format!("unexpected word `{other}` in `{block}`"))),
            }
        }

        // Aperture selection.
        if let Some(code) = d
            && code >= 10
        {
            return Ok(());
        }
        if let Some(code) = d {
            self.operation = Some(code);
        }
        if x.is_none() && y.is_none() {
            return Ok(());
        }

        let incremental = self.format.is_some_and(|f| f.incremental);
        let resolve = |value: Option<f64>, current: f64| match value {
            Some(v) if incremental => current + self.units.to_mm(v),
            Some(v) => self.units.to_mm(v),
            None => current,
        };
        let (nx, ny) = (resolve(x, self.x), resolve(y, self.y));

        match self.operation.unwrap_or(2) {
            1 => {
                self.include(self.x, self.y);
                self.include(nx, ny);
            }
            2 | 3 => self.include(nx, ny),
            other => return Err(bad(format!("unknown operation D{other:02}"))),
        }
        self.x = nx;
        self.y = ny;
        Ok(())
    }
}

/// Compute the bounds (in millimetres) of all drawn or flashed points.
pub(super) fn scan_bounds(text: &str) -> Result<Bounds, OutlineError> {
    let mut scanner = Scanner::new();
    let mut index = 0;

    // `%` toggles between data blocks and extended commands.
    for (segment_index, segment) in text.split('%').enumerate() {
        let extended = segment_index % 2 == 1;
        let mut in_macro = false;
        for command in segment.split('*') {
            let command: String = command.chars().filter(|c| !c.is_whitespace()).collect();
            if command.is_empty() {
                continue;
            }
            index += 1;
            if extended {
                // An aperture macro runs to the end of its block; its
                // primitives are not parameters.
                in_macro |= command.starts_with("AM");
                if !in_macro {
                    scanner.extended(index, &command)?;
                }
            } else {
                scanner.data_block(index, &command)?;
            }
        }
    }

    scanner.bounds.ok_or(OutlineError::Empty)
}
