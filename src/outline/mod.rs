//! Board outline sources.
//!
//! # Modules
//!
//! - [`gerber`]: RS-274X outline reader
//!
//! An [`OutlineProvider`] yields the board bounding box as a
//! [`BoardGeometry`] with the Y axis flipped to the SVG convention
//! (down is positive): `origin_y` is the negated maximum Y bound.

mod gerber;

pub use gerber::GerberOutline;

use crate::geometry::{BoardGeometry, GeometryError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Outline file name inside a Gerber export directory.
pub const GERBER_OUTLINE_FILE: &str = "Gerber_BoardOutlineLayer.GKO";

#[derive(Debug, Error)]
pub enum OutlineError {
    #[error("no board outline source: pass --gerber <dir> or --outline <file>")]
    NotFound,

    #[error("outline file `{0}` does not exist")]
    Missing(PathBuf),

    #[error("failed to read outline `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("malformed outline at command {index}: {message}")]
    Parse { index: usize, message: String },

    #[error("outline contains no coordinates")]
    Empty,

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Anything that can produce the board bounding box.
pub trait OutlineProvider {
    fn board_geometry(&self) -> Result<BoardGeometry, OutlineError>;
}

/// Axis-aligned bounds in source coordinates (Y up), millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn point(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
        }
    }

    pub fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    /// Convert to board geometry, flipping the Y axis.
    pub fn to_geometry(self) -> Result<BoardGeometry, OutlineError> {
        Ok(BoardGeometry::new(
            self.min_x,
            -self.max_y,
            self.max_x - self.min_x,
            self.max_y - self.min_y,
        )?)
    }
}

/// Resolved outline location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineSource {
    /// Outline file to read.
    pub path: PathBuf,
    /// Gerber export directory, when the outline came from one.
    pub gerber_dir: Option<PathBuf>,
}

impl OutlineSource {
    /// Resolve the outline file from CLI inputs.
    ///
    /// A Gerber directory wins over a direct outline path.
    pub fn resolve(gerber_dir: Option<&Path>, outline: Option<&Path>) -> Result<Self, OutlineError> {
        let source = match (gerber_dir, outline) {
            (Some(dir), _) => Self {
                path: dir.join(GERBER_OUTLINE_FILE),
                gerber_dir: Some(dir.to_path_buf()),
            },
            (None, Some(path)) => Self {
                path: path.to_path_buf(),
                gerber_dir: None,
            },
            (None, None) => return Err(OutlineError::NotFound),
        };

        if !source.path.is_file() {
            return Err(OutlineError::Missing(source.path));
        }
        Ok(source)
    }

    pub fn provider(&self) -> GerberOutline {
        GerberOutline::new(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_bounds_flip_y() {
        let mut bounds = Bounds::point(10.0, 5.0);
        bounds.include(60.0, 35.0);
        let g = bounds.to_geometry().unwrap();
        assert_eq!(g.origin_x, 10.0);
        assert_eq!(g.origin_y, -35.0);
        assert_eq!(g.width, 50.0);
        assert_eq!(g.height, 30.0);
    }

    #[test]
    fn test_bounds_degenerate() {
        let bounds = Bounds::point(1.0, 1.0);
        assert!(matches!(bounds.to_geometry(), Err(OutlineError::Geometry(_))));
    }

    #[test]
    fn test_resolve_requires_a_source() {
        assert!(matches!(
            OutlineSource::resolve(None, None),
            Err(OutlineError::NotFound)
        ));
    }

    #[test]
    fn test_resolve_gerber_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(GERBER_OUTLINE_FILE), "").unwrap();
        let other = dir.path().join("other.gko");
        fs::write(&other, "").unwrap();

        let source = OutlineSource::resolve(Some(dir.path()), Some(&other)).unwrap();
        assert_eq!(source.path, dir.path().join(GERBER_OUTLINE_FILE));
        assert_eq!(source.gerber_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_resolve_direct_outline() {
        let dir = TempDir::new().unwrap();
        let outline = dir.path().join("board.gm1");
        fs::write(&outline, "").unwrap();

        let source = OutlineSource::resolve(None, Some(&outline)).unwrap();
        assert_eq!(source.path, outline);
        assert!(source.gerber_dir.is_none());
    }

    #[test]
    fn test_resolve_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = OutlineSource::resolve(Some(dir.path()), None).unwrap_err();
        assert!(matches!(err, OutlineError::Missing(_)));
    }
}
