//! SVG text rendering of a [`VectorDocument`].
//!
//! Attribute order is fixed per element, so equal trees always serialize
//! to identical bytes.

use super::document::{ClipPath, Num, Trace, VectorDocument};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use thiserror::Error;

pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n";

const NAMESPACES: [(&str, &str); 5] = [
    ("xmlns:inkscape", "http://www.inkscape.org/namespaces/inkscape"),
    ("xmlns:sodipodi", "http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd"),
    ("xmlns:xlink", "http://www.w3.org/1999/xlink"),
    ("xmlns", "http://www.w3.org/2000/svg"),
    ("xmlns:svg", "http://www.w3.org/2000/svg"),
];

const CLIP_STYLE: &str = "fill-opacity:1;fill-rule:nonzero;fill:block;";

/// Writing into memory failed; the tree itself is always well-formed.
#[derive(Debug, Error)]
#[error("failed to serialize silkscreen document: {0}")]
pub struct SerializeError(String);

/// Render a document as SVG text with the XML declaration prepended.
pub fn serialize(doc: &VectorDocument) -> Result<String, SerializeError> {
    let mut writer = SvgWriter::new();
    writer.document(doc)?;
    let body = String::from_utf8(writer.inner.into_inner())
        .map_err(|e| SerializeError(e.to_string()))?;
    Ok(format!("{XML_DECLARATION}{body}"))
}

fn join_box(values: &[f64; 4]) -> String {
    values
        .iter()
        .map(|v| Num(*v).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

struct SvgWriter {
    inner: Writer<Vec<u8>>,
}

impl SvgWriter {
    fn new() -> Self {
        Self {
            inner: Writer::new(Vec::new()),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), SerializeError> {
        self.inner
            .write_event(event)
            .map_err(|e| SerializeError(e.to_string()))
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), SerializeError> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.event(Event::Start(elem))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), SerializeError> {
        let elem = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.event(Event::Empty(elem))
    }

    fn end(&mut self, name: &str) -> Result<(), SerializeError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    fn document(&mut self, doc: &VectorDocument) -> Result<(), SerializeError> {
        let canvas = &doc.canvas;
        let width = format!("{}mm", Num(canvas.width_mm));
        let height = format!("{}mm", Num(canvas.height_mm));
        let board_box = join_box(&canvas.board_box);
        let view_box = join_box(&canvas.view_box);

        let mut attrs = vec![
            ("width", width.as_str()),
            ("height", height.as_str()),
            ("boardBox", board_box.as_str()),
            ("viewBox", view_box.as_str()),
            ("version", "1.1"),
        ];
        attrs.extend(NAMESPACES);
        self.start("svg", &attrs)?;

        self.clip_path(&doc.outer_clip)?;
        self.clip_path(&doc.inner_clip)?;

        let group = &doc.group;
        let clip = format!("url(#{})", group.clip_ref);
        let transform = group.transform.to_string();
        self.start("g", &[("clip-path", clip.as_str()), ("transform", transform.as_str())])?;
        self.background(&group.background)?;

        let image = &group.image;
        let (w, h) = (image.width.to_string(), image.height.to_string());
        let matrix = image.transform.to_string();
        self.empty(
            "image",
            &[
                ("width", w.as_str()),
                ("height", h.as_str()),
                ("preserveAspectRatio", "none"),
                ("xlink:href", image.href.as_str()),
                ("transform", matrix.as_str()),
            ],
        )?;

        self.end("g")?;
        self.end("svg")
    }

    fn clip_path(&mut self, clip: &ClipPath) -> Result<(), SerializeError> {
        self.start("defs", &[])?;

        let reference = clip.clip_ref.map(|id| format!("url(#{id})"));
        let mut attrs = vec![("id", clip.id)];
        if let Some(reference) = &reference {
            attrs.push(("clip-path", reference.as_str()));
        }
        self.start("clipPath", &attrs)?;

        let d = clip.trace.path_data();
        self.empty(
            "path",
            &[
                ("d", d.as_str()),
                ("id", clip.path_id),
                ("stroke", "none"),
                ("style", CLIP_STYLE),
            ],
        )?;

        self.end("clipPath")?;
        self.end("defs")
    }

    fn background(&mut self, trace: &Trace) -> Result<(), SerializeError> {
        let d = trace.path_data();
        self.empty(
            "path",
            &[
                ("d", d.as_str()),
                ("fill", "#FFFFFF"),
                ("stroke", "none"),
                ("stroke-width", "0"),
                ("id", "background"),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BoardGeometry, Side};
    use crate::layer::{ComposeOptions, compose_layer};
    use crate::raster::{RasterImageRef, mime};
    use quick_xml::Reader;
    use std::collections::BTreeMap;

    type Element = (String, BTreeMap<String, String>);

    /// Collect every element with its raw attribute values.
    fn parse(svg: &str) -> Vec<Element> {
        let mut reader = Reader::from_str(svg);
        let mut elements = Vec::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) | Event::Empty(e) => {
                    let name = String::from_utf8(e.name().as_ref().to_vec()).unwrap();
                    let attrs = e
                        .attributes()
                        .map(|a| {
                            let a = a.unwrap();
                            (
                                String::from_utf8(a.key.as_ref().to_vec()).unwrap(),
                                String::from_utf8(a.value.to_vec()).unwrap(),
                            )
                        })
                        .collect();
                    elements.push((name, attrs));
                }
                Event::Eof => break,
                _ => {}
            }
        }
        elements
    }

    fn find<'a>(elements: &'a [Element], name: &str) -> Vec<&'a BTreeMap<String, String>> {
        elements
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, attrs)| attrs)
            .collect()
    }

    fn numbers(text: &str) -> Vec<f64> {
        text.split(|c: char| c == ' ' || c == '(' || c == ')')
            .filter_map(|t| t.parse().ok())
            .collect()
    }

    fn document(side: Side) -> VectorDocument {
        let geometry = BoardGeometry::new(0.0, 0.0, 100.0, 60.0).unwrap();
        let image = RasterImageRef {
            pixel_width: 1000,
            pixel_height: 600,
            media_type: mime::types::PNG,
            bytes: b"pixels".to_vec(),
        };
        compose_layer(&geometry, &image, side, &ComposeOptions::default()).unwrap()
    }

    #[test]
    fn test_header_and_root() {
        let svg = serialize(&document(Side::Top)).unwrap();
        assert!(svg.starts_with(XML_DECLARATION));

        let elements = parse(&svg);
        let root = &elements[0];
        assert_eq!(root.0, "svg");
        assert_eq!(root.1["width"], "100mm");
        assert_eq!(root.1["height"], "60mm");
        assert_eq!(root.1["xmlns:xlink"], "http://www.w3.org/1999/xlink");

        let board_box = numbers(&root.1["boardBox"]);
        assert_eq!(board_box.len(), 4);
        for (got, want) in board_box.iter().zip([0.0, 0.0, 393.7, 236.2]) {
            assert!((got - want).abs() < 0.1, "{got} vs {want}");
        }
    }

    #[test]
    fn test_round_trip_structure() {
        for side in Side::ALL {
            let doc = document(side);
            let elements = parse(&serialize(&doc).unwrap());

            let clips = find(&elements, "clipPath");
            assert_eq!(clips.len(), 2);
            assert_eq!(clips[0]["id"], "clipPath0");
            assert_eq!(clips[1]["clip-path"], "url(#clipPath0)");

            let paths = find(&elements, "path");
            assert_eq!(paths.len(), 3);
            for (path, trace) in paths.iter().zip([
                &doc.outer_clip.trace,
                &doc.inner_clip.trace,
                &doc.group.background,
            ]) {
                let coords = numbers(&path["d"]);
                assert_eq!(coords.len(), 10, "5 points per trace");
                assert_eq!(coords[..2], coords[8..]);
                for (pair, point) in coords.chunks(2).zip(&trace.points) {
                    assert!((pair[0] - point.x).abs() < 1e-9);
                    assert!((pair[1] - point.y).abs() < 1e-9);
                }
            }

            let images = find(&elements, "image");
            assert_eq!(images.len(), 1);
            let image = images[0];
            assert_eq!(image["preserveAspectRatio"], "none");
            assert!(image["xlink:href"].starts_with("data:image/png;base64,"));

            let m = doc.group.image.transform;
            let matrix = numbers(&image["transform"]);
            for (got, want) in matrix.iter().zip([m.a, m.b, m.c, m.d, m.e, m.f]) {
                assert!((got - want).abs() < 1e-12);
            }

            let group = find(&elements, "g")[0];
            assert_eq!(group["clip-path"], "url(#clipPath1)");
        }
    }

    #[test]
    fn test_group_transform_per_side() {
        let top = parse(&serialize(&document(Side::Top)).unwrap());
        assert_eq!(find(&top, "g")[0]["transform"], "scale(1 1) translate(0 0)");

        let bottom = parse(&serialize(&document(Side::Bottom)).unwrap());
        let transform = &find(&bottom, "g")[0]["transform"];
        assert!(transform.starts_with("scale(-1 1) translate(-393.7"));
        assert!(transform.ends_with(" 0)"));
    }

    #[test]
    fn test_deterministic_output() {
        let doc = document(Side::Bottom);
        assert_eq!(serialize(&doc).unwrap(), serialize(&doc.clone()).unwrap());
    }

    #[test]
    fn test_no_negative_zero_in_output() {
        let svg = serialize(&document(Side::Bottom)).unwrap();
        assert!(!svg.contains("-0 "));
    }

    #[test]
    fn test_legacy_shear_uses_canonical_numbers() {
        let geometry = BoardGeometry::new(0.0, 0.0, 100.0, 60.0).unwrap();
        let image = RasterImageRef {
            pixel_width: 1000,
            pixel_height: 600,
            media_type: mime::types::PNG,
            bytes: b"pixels".to_vec(),
        };
        let options = ComposeOptions {
            quirks: crate::layer::LegacyQuirks::ALL,
            ..ComposeOptions::default()
        };
        let doc = compose_layer(&geometry, &image, Side::Bottom, &options).unwrap();
        let svg = serialize(&doc).unwrap();

        let elements = parse(&svg);
        let matrix = numbers(&find(&elements, "image")[0]["transform"]);
        assert_eq!(matrix[2], crate::layer::compose::LEGACY_BOTTOM_SHEAR);
        assert!(!svg.contains("e-18"));
        assert_eq!(find(&elements, "svg")[0]["width"], "100mm");
    }
}
