//! Media types for embedded raster payloads.

use image::ImageFormat;

pub mod types {
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const WEBP: &str = "image/webp";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}

/// Media type for a sniffed image format.
pub fn from_format(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => types::PNG,
        ImageFormat::Jpeg => types::JPEG,
        ImageFormat::WebP => types::WEBP,
        _ => types::OCTET_STREAM,
    }
}
