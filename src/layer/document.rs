//! Typed silkscreen document tree.
//!
//! The topology is fixed: canvas, outer clip, inner clip chained to the
//! outer one, and a clipped group holding the background and one image.

use std::fmt;

/// Number formatting used for every coordinate in the document.
///
/// Shortest round-trip representation, with negative zero folded to `0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Num(pub f64);

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = if self.0 == 0.0 { 0.0 } else { self.0 };
        write!(f, "{value}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Closed rectangular polygon: four corners plus the repeated start.
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub points: [Point; 5],
}

impl Trace {
    /// Close a four-corner walk by repeating its first corner.
    pub fn closed(corners: [Point; 4]) -> Self {
        let [a, b, c, d] = corners;
        Self {
            points: [a, b, c, d, a],
        }
    }

    /// SVG path data: `M x y L x y x y x y x y`.
    pub fn path_data(&self) -> String {
        let [first, rest @ ..] = &self.points;
        let mut d = format!("M {} {} L", Num(first.x), Num(first.y));
        for p in rest {
            d.push_str(&format!(" {} {}", Num(p.x), Num(p.y)));
        }
        d
    }
}

/// Root `<svg>` attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    /// Physical width in millimetres.
    pub width_mm: f64,
    /// Physical height in millimetres.
    pub height_mm: f64,
    /// Board origin and size in drawing units, read by downstream tooling.
    pub board_box: [f64; 4],
    pub view_box: [f64; 4],
}

/// `<clipPath>` wrapping one trace.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPath {
    pub id: &'static str,
    pub path_id: &'static str,
    /// Clip path this one is further restricted by.
    pub clip_ref: Option<&'static str>,
    pub trace: Trace,
}

/// Transform of the content group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GroupTransform {
    Identity,
    /// Horizontal mirror: `x -> offset - x`.
    Mirror { offset: f64 },
}

impl GroupTransform {
    /// Map an x coordinate from group space to document space.
    pub fn apply_x(&self, x: f64) -> f64 {
        match self {
            Self::Identity => x,
            Self::Mirror { offset } => offset - x,
        }
    }
}

impl fmt::Display for GroupTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("scale(1 1) translate(0 0)"),
            Self::Mirror { offset } => write!(f, "scale(-1 1) translate({} 0)", Num(-offset)),
        }
    }
}

/// SVG affine matrix `(a b c d e f)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "matrix({} {} {} {} {} {})",
            Num(self.a),
            Num(self.b),
            Num(self.c),
            Num(self.d),
            Num(self.e),
            Num(self.f)
        )
    }
}

/// Embedded `<image>`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageElement {
    pub width: u32,
    pub height: u32,
    /// `data:` URI with the encoded payload.
    pub href: String,
    pub transform: Matrix,
}

/// Clipped content group.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub clip_ref: &'static str,
    pub transform: GroupTransform,
    /// Opaque white fill beneath the artwork.
    pub background: Trace,
    pub image: ImageElement,
}

/// One complete silkscreen layer.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDocument {
    pub canvas: Canvas,
    pub outer_clip: ClipPath,
    pub inner_clip: ClipPath,
    pub group: Group,
}

impl VectorDocument {
    /// Horizontal extent `(min_x, max_x)` of the artwork as rendered.
    pub fn artwork_span(&self) -> (f64, f64) {
        let image = &self.group.image;
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(f64::from(image.width), f64::from(image.height)),
        ];
        let [a, b] = corners.map(|p| self.group.transform.apply_x(image.transform.apply(p).x));
        (a.min(b), a.max(b))
    }
}
