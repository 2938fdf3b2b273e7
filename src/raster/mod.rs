//! Raster artwork loading.
//!
//! Only the image header is decoded: the pixel size drives the placement
//! transform, and the original encoded bytes are embedded untouched.

pub mod mime;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::ImageReader;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("cannot read image `{path}`: {reason}")]
pub struct ImageReadError {
    pub path: PathBuf,
    pub reason: String,
}

impl ImageReadError {
    fn new(path: &Path, reason: impl ToString) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Encoded raster image plus its pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImageRef {
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

impl RasterImageRef {
    /// Read and sniff an image file.
    ///
    /// Fails when the file is unreadable, the format is unknown, or the
    /// header reports a zero-sized image.
    pub fn load(path: &Path) -> Result<Self, ImageReadError> {
        let bytes = fs::read(path).map_err(|e| ImageReadError::new(path, e))?;
        Self::from_bytes(bytes).map_err(|reason| ImageReadError::new(path, reason))
    }

    /// Sniff an in-memory encoded image.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, String> {
        let reader = ImageReader::new(Cursor::new(bytes.as_slice()))
            .with_guessed_format()
            .map_err(|e| e.to_string())?;
        let format = reader.format().ok_or("unrecognized image format")?;
        let (pixel_width, pixel_height) = reader.into_dimensions().map_err(|e| e.to_string())?;
        if pixel_width == 0 || pixel_height == 0 {
            return Err(format!("empty image ({pixel_width}x{pixel_height})"));
        }

        Ok(Self {
            pixel_width,
            pixel_height,
            media_type: mime::from_format(format),
            bytes,
        })
    }

    /// Inline `data:` reference carrying media type and base64 payload.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, STANDARD.encode(&self.bytes))
    }
}
