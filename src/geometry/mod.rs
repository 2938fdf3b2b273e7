//! Board geometry and drawing-unit conversion.
//!
//! All lengths enter the system in millimetres and leave it in drawing
//! units (1/10 mil, 2.54 µm), the native unit of the silkscreen SVG.

use std::fmt;
use thiserror::Error;

/// Millimetres per drawing unit.
pub const MM_PER_UNIT: f64 = 0.254;

/// Convert a length in millimetres to drawing units.
///
/// Negative lengths are valid (translation offsets). The result is never
/// rounded: every coordinate downstream chains through this conversion.
#[inline]
pub fn to_drawing_units(mm: f64) -> f64 {
    mm / MM_PER_UNIT
}

#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    #[error("invalid board geometry: width {width}mm x height {height}mm (both must be > 0)")]
    InvalidGeometry { width: f64, height: f64 },
}

/// Board bounding box in millimetres, Y axis pointing down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardGeometry {
    pub origin_x: f64,
    pub origin_y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoardGeometry {
    /// Create a validated geometry.
    ///
    /// Non-finite or non-positive dimensions are rejected.
    pub fn new(origin_x: f64, origin_y: f64, width: f64, height: f64) -> Result<Self, GeometryError> {
        let geometry = Self {
            origin_x,
            origin_y,
            width,
            height,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Check the size invariant of a geometry built field by field.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if valid(self.width) && valid(self.height) {
            Ok(())
        } else {
            Err(GeometryError::InvalidGeometry {
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Left edge in drawing units.
    pub fn left(&self) -> f64 {
        to_drawing_units(self.origin_x)
    }

    /// Right edge in drawing units.
    pub fn right(&self) -> f64 {
        to_drawing_units(self.origin_x + self.width)
    }

    /// Top edge in drawing units (smallest Y, since Y points down).
    pub fn top(&self) -> f64 {
        to_drawing_units(self.origin_y)
    }

    /// Bottom edge in drawing units.
    pub fn bottom(&self) -> f64 {
        to_drawing_units(self.origin_y + self.height)
    }
}

impl fmt::Display for BoardGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}mm x {}mm at ({}, {})",
            self.width, self.height, self.origin_x, self.origin_y
        )
    }
}

/// Board face a silkscreen layer is printed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Top,
    Bottom,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Top, Side::Bottom];

    /// Whether artwork on this side is mirrored horizontally.
    pub const fn is_mirrored(self) -> bool {
        matches!(self, Self::Bottom)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_to_drawing_units_scale() {
        assert!(approx(to_drawing_units(0.254), 1.0));
        assert!(approx(to_drawing_units(25.4), 100.0));
        assert!(approx(to_drawing_units(-2.54), -10.0));
        assert_eq!(to_drawing_units(0.0), 0.0);
    }

    #[test]
    fn test_to_drawing_units_linear() {
        let samples = [(0.0, 1.5), (12.7, 33.3), (100.0, 60.0), (-4.2, 0.001), (1e-3, 1e3)];
        for (a, b) in samples {
            let sum = to_drawing_units(a + b);
            let split = to_drawing_units(a) + to_drawing_units(b);
            assert!((sum - split).abs() <= 1e-9 * sum.abs().max(1.0), "{a} + {b}");
        }
    }

    #[test]
    fn test_board_geometry_rejects_non_positive() {
        assert_eq!(
            BoardGeometry::new(0.0, 0.0, 0.0, 10.0),
            Err(GeometryError::InvalidGeometry { width: 0.0, height: 10.0 })
        );
        assert!(BoardGeometry::new(0.0, 0.0, 10.0, -1.0).is_err());
        assert!(BoardGeometry::new(0.0, 0.0, f64::NAN, 1.0).is_err());
        assert!(BoardGeometry::new(-5.0, -20.0, 10.0, 20.0).is_ok());
    }

    #[test]
    fn test_board_edges() {
        let g = BoardGeometry::new(2.54, -25.4, 25.4, 12.7).unwrap();
        assert!(approx(g.left(), 10.0));
        assert!(approx(g.right(), 110.0));
        assert!(approx(g.top(), -100.0));
        assert!(approx(g.bottom(), -50.0));
    }

    #[test]
    fn test_side_mirroring() {
        assert!(!Side::Top.is_mirrored());
        assert!(Side::Bottom.is_mirrored());
        assert_eq!(Side::Bottom.to_string(), "bottom");
    }
}
