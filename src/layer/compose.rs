//! Board-fitted layer composition.
//!
//! Coordinates below use `L`/`R` for the board's left/right edges and
//! `T`/`B` for its top/bottom edges, all in drawing units, with `t` the
//! clip tolerance.

use super::LayerError;
use super::document::{
    Canvas, ClipPath, Group, GroupTransform, ImageElement, Matrix, Point, Trace, VectorDocument,
};
use crate::geometry::{BoardGeometry, Side, to_drawing_units};
use crate::raster::RasterImageRef;
use serde::Deserialize;

/// Clip inset/outset in drawing units.
pub const CLIP_TOLERANCE: f64 = 0.05;

/// Shear term of legacy bottom-layer output.
pub const LEGACY_BOTTOM_SHEAR: f64 = 4.8214441229528465e-18;

pub const OUTER_CLIP_ID: &str = "clipPath0";
pub const INNER_CLIP_ID: &str = "clipPath1";

/// Reference-tool output quirks.
///
/// Each switch reproduces one quirky value; formatting stays canonical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LegacyQuirks {
    /// Image `height` attribute carries the pixel width.
    pub image_height_from_width: bool,
    /// Bottom matrix carries a tiny non-zero shear.
    pub bottom_shear: bool,
    /// `viewBox` repeats the board height where the width belongs.
    pub square_view_box: bool,
}

impl LegacyQuirks {
    pub const ALL: Self = Self {
        image_height_from_width: true,
        bottom_shear: true,
        square_view_box: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposeOptions {
    pub tolerance: f64,
    pub quirks: LegacyQuirks,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            tolerance: CLIP_TOLERANCE,
            quirks: LegacyQuirks::default(),
        }
    }
}

/// Build the silkscreen document placing `image` over the board for `side`.
pub fn compose_layer(
    geometry: &BoardGeometry,
    image: &RasterImageRef,
    side: Side,
    options: &ComposeOptions,
) -> Result<VectorDocument, LayerError> {
    geometry.validate()?;
    if image.pixel_width == 0 || image.pixel_height == 0 {
        return Err(LayerError::EmptyImage {
            width: image.pixel_width,
            height: image.pixel_height,
        });
    }

    let t = options.tolerance;
    Ok(VectorDocument {
        canvas: canvas(geometry, &options.quirks),
        outer_clip: ClipPath {
            id: OUTER_CLIP_ID,
            path_id: "outline0",
            clip_ref: None,
            trace: outer_trace(geometry, side, t),
        },
        inner_clip: ClipPath {
            id: INNER_CLIP_ID,
            path_id: "solder1",
            clip_ref: Some(OUTER_CLIP_ID),
            trace: outset_trace(geometry, t),
        },
        group: Group {
            clip_ref: INNER_CLIP_ID,
            transform: group_transform(geometry, side),
            background: background_trace(geometry, t),
            image: ImageElement {
                width: image.pixel_width,
                height: if options.quirks.image_height_from_width {
                    image.pixel_width
                } else {
                    image.pixel_height
                },
                href: image.data_uri(),
                transform: image_matrix(geometry, image, side, &options.quirks),
            },
        },
    })
}

fn canvas(g: &BoardGeometry, quirks: &LegacyQuirks) -> Canvas {
    let x = to_drawing_units(g.origin_x);
    let y = to_drawing_units(g.origin_y);
    let w = to_drawing_units(g.width);
    let h = to_drawing_units(g.height);
    Canvas {
        width_mm: g.width,
        height_mm: g.height,
        board_box: [x, y, w, h],
        view_box: [x, y, if quirks.square_view_box { h } else { w }, h],
    }
}

/// Board edge inset by `t`.
///
/// Top walks `(L,B) (L,T) (R,T) (R,B)`. Bottom walks the horizontal mirror
/// of that sequence, which the group mirror maps back onto the Top walk.
fn outer_trace(g: &BoardGeometry, side: Side, t: f64) -> Trace {
    let (l, r) = (g.left() + t, g.right() - t);
    let (top, bottom) = (g.top() + t, g.bottom() - t);
    match side {
        Side::Top => Trace::closed([
            Point::new(l, bottom),
            Point::new(l, top),
            Point::new(r, top),
            Point::new(r, bottom),
        ]),
        Side::Bottom => Trace::closed([
            Point::new(r, bottom),
            Point::new(r, top),
            Point::new(l, top),
            Point::new(l, bottom),
        ]),
    }
}

/// Board edge outset by `t`, `(L,B) (L,T) (R,T) (R,B)`.
fn outset_trace(g: &BoardGeometry, t: f64) -> Trace {
    let (l, r) = (g.left() - t, g.right() + t);
    let (top, bottom) = (g.top() - t, g.bottom() + t);
    Trace::closed([
        Point::new(l, bottom),
        Point::new(l, top),
        Point::new(r, top),
        Point::new(r, bottom),
    ])
}

/// Background fill over the outset board, `(L,B) (R,B) (R,T) (L,T)`.
fn background_trace(g: &BoardGeometry, t: f64) -> Trace {
    let (l, r) = (g.left() - t, g.right() + t);
    let (top, bottom) = (g.top() - t, g.bottom() + t);
    Trace::closed([
        Point::new(l, bottom),
        Point::new(r, bottom),
        Point::new(r, top),
        Point::new(l, top),
    ])
}

/// Mirror about the board's vertical centerline for the bottom side.
fn group_transform(g: &BoardGeometry, side: Side) -> GroupTransform {
    if side.is_mirrored() {
        GroupTransform::Mirror {
            offset: to_drawing_units(2.0 * g.origin_x + g.width),
        }
    } else {
        GroupTransform::Identity
    }
}

/// Map the image's pixel rectangle onto the board rectangle.
fn image_matrix(
    g: &BoardGeometry,
    image: &RasterImageRef,
    side: Side,
    quirks: &LegacyQuirks,
) -> Matrix {
    let sx = to_drawing_units(g.width) / f64::from(image.pixel_width);
    let sy = to_drawing_units(g.height) / f64::from(image.pixel_height);
    match side {
        Side::Top => Matrix {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            e: to_drawing_units(g.origin_x),
            f: to_drawing_units(g.origin_y),
        },
        Side::Bottom => {
            let shear = if quirks.bottom_shear { LEGACY_BOTTOM_SHEAR } else { 0.0 };
            Matrix {
                a: -sx,
                b: -shear,
                c: shear,
                d: sy,
                e: to_drawing_units(g.origin_x + g.width),
                f: to_drawing_units(g.origin_y),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GeometryError;
    use crate::raster::mime;

    fn image(width: u32, height: u32) -> RasterImageRef {
        RasterImageRef {
            pixel_width: width,
            pixel_height: height,
            media_type: mime::types::PNG,
            bytes: vec![0x89, b'P', b'N', b'G'],
        }
    }

    fn compose(geometry: BoardGeometry, img: &RasterImageRef, side: Side) -> VectorDocument {
        compose_layer(&geometry, img, side, &ComposeOptions::default()).unwrap()
    }

    fn board(x: f64, y: f64, w: f64, h: f64) -> BoardGeometry {
        BoardGeometry::new(x, y, w, h).unwrap()
    }

    #[test]
    fn test_top_translation_is_board_origin() {
        let g = board(12.5, -47.0, 40.0, 20.0);
        let doc = compose(g, &image(800, 400), Side::Top);
        let m = doc.group.image.transform;
        assert_eq!(m.e, to_drawing_units(12.5));
        assert_eq!(m.f, to_drawing_units(-47.0));
        assert_eq!((m.b, m.c), (0.0, 0.0));
        assert_eq!(doc.group.transform, GroupTransform::Identity);
    }

    #[test]
    fn test_bottom_scale_negates_top() {
        let g = board(3.0, -33.0, 50.0, 30.0);
        let img = image(640, 480);
        let top = compose(g, &img, Side::Top).group.image.transform;
        let bottom = compose(g, &img, Side::Bottom).group.image.transform;
        assert_eq!(bottom.a, -top.a);
        assert_eq!(bottom.d, top.d);
        assert_eq!(bottom.e, to_drawing_units(53.0));
        assert_eq!(bottom.f, top.f);
        assert_eq!((bottom.b, bottom.c), (-0.0, 0.0));
    }

    #[test]
    fn test_bottom_artwork_lands_on_board() {
        let g = board(0.0, 0.0, 50.0, 30.0);
        let doc = compose(g, &image(500, 300), Side::Bottom);
        let m = doc.group.image.transform;

        assert_eq!(doc.group.transform, GroupTransform::Mirror { offset: to_drawing_units(50.0) });

        // Image's own transform: pixel column 0 at the board's right edge.
        let start = m.apply(Point::new(0.0, 0.0));
        let end = m.apply(Point::new(500.0, 300.0));
        assert!((start.x - to_drawing_units(50.0)).abs() < 1e-9);
        assert!(end.x.abs() < 1e-9);

        // Group mirror brings the artwork back into [0, du(50)].
        let left = doc.group.transform.apply_x(start.x);
        let right = doc.group.transform.apply_x(end.x);
        assert!(left.abs() < 1e-9);
        assert!((right - to_drawing_units(50.0)).abs() < 1e-9);
        assert!((end.y - to_drawing_units(30.0)).abs() < 1e-9);

        let (min_x, max_x) = doc.artwork_span();
        let (top_min, top_max) = compose(g, &image(500, 300), Side::Top).artwork_span();
        assert!(min_x.abs() < 1e-9 && (max_x - to_drawing_units(50.0)).abs() < 1e-9);
        assert!(top_min.abs() < 1e-9 && (top_max - max_x).abs() < 1e-9);
    }

    #[test]
    fn test_mirror_offset_with_nonzero_origin() {
        let g = board(10.0, -40.0, 30.0, 40.0);
        let doc = compose(g, &image(300, 400), Side::Bottom);
        let mirror = doc.group.transform;
        // The board maps onto itself under the mirror.
        assert!((mirror.apply_x(g.left()) - g.right()).abs() < 1e-9);
        assert!((mirror.apply_x(g.right()) - g.left()).abs() < 1e-9);
    }

    #[test]
    fn test_image_covers_board_exactly() {
        let g = board(5.0, -65.0, 100.0, 60.0);
        let doc = compose(g, &image(1000, 600), Side::Top);
        let m = doc.group.image.transform;
        let far = m.apply(Point::new(1000.0, 600.0));
        assert!((far.x - g.right()).abs() < 1e-9);
        assert!((far.y - g.bottom()).abs() < 1e-9);
        assert_eq!((doc.group.image.width, doc.group.image.height), (1000, 600));
    }

    #[test]
    fn test_clip_traces() {
        let g = board(0.0, 0.0, 25.4, 12.7);
        let t = CLIP_TOLERANCE;
        let top = compose(g, &image(10, 10), Side::Top);
        let bottom = compose(g, &image(10, 10), Side::Bottom);

        let (l, r, tp, b) = (g.left(), g.right(), g.top(), g.bottom());

        let outer = &top.outer_clip.trace.points;
        assert_eq!(outer[0], Point::new(l + t, b - t));
        assert_eq!(outer[2], Point::new(r - t, tp + t));
        assert_eq!(outer[4], outer[0]);

        let mirrored = &bottom.outer_clip.trace.points;
        assert_eq!(mirrored[0], Point::new(r - t, b - t));
        assert_eq!(mirrored[2], Point::new(l + t, tp + t));
        assert_eq!(mirrored[4], mirrored[0]);

        let inner = &top.inner_clip.trace.points;
        assert_eq!(inner[0], Point::new(l - t, b + t));
        assert_eq!(inner[2], Point::new(r + t, tp - t));
        assert_eq!(top.inner_clip.clip_ref, Some(OUTER_CLIP_ID));
        assert_eq!(top.inner_clip, bottom.inner_clip);
        assert_eq!(top.group.clip_ref, INNER_CLIP_ID);
    }

    #[test]
    fn test_canvas_board_box() {
        let g = board(0.0, 0.0, 100.0, 60.0);
        let doc = compose(g, &image(1000, 600), Side::Top);
        assert_eq!((doc.canvas.width_mm, doc.canvas.height_mm), (100.0, 60.0));
        let [x, y, w, h] = doc.canvas.board_box;
        assert_eq!((x, y), (0.0, 0.0));
        assert!((w - 393.7).abs() < 0.1);
        assert!((h - 236.2).abs() < 0.1);
        assert_eq!(doc.canvas.view_box, doc.canvas.board_box);
    }

    #[test]
    fn test_legacy_quirks() {
        let g = board(0.0, 0.0, 100.0, 60.0);
        let options = ComposeOptions {
            quirks: LegacyQuirks::ALL,
            ..ComposeOptions::default()
        };
        let doc = compose_layer(&g, &image(1000, 600), Side::Bottom, &options).unwrap();
        assert_eq!(doc.group.image.height, 1000);
        assert_eq!(doc.group.image.transform.c, LEGACY_BOTTOM_SHEAR);
        assert_eq!(doc.group.image.transform.b, -LEGACY_BOTTOM_SHEAR);
        assert_eq!(doc.canvas.view_box[2], doc.canvas.view_box[3]);
    }

    #[test]
    fn test_invalid_inputs() {
        let g = BoardGeometry { origin_x: 0.0, origin_y: 0.0, width: 0.0, height: 60.0 };
        let err = compose_layer(&g, &image(10, 10), Side::Top, &ComposeOptions::default());
        assert!(matches!(
            err,
            Err(LayerError::Geometry(GeometryError::InvalidGeometry { .. }))
        ));

        let g = board(0.0, 0.0, 10.0, 10.0);
        let err = compose_layer(&g, &image(0, 10), Side::Top, &ComposeOptions::default());
        assert!(matches!(err, Err(LayerError::EmptyImage { .. })));
    }
}
