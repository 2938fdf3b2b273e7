//! Silkscreen layer construction.
//!
//! # Modules
//!
//! - [`document`]: typed SVG document tree
//! - [`compose`]: board-fitted placement of the artwork per side
//! - [`serialize`]: deterministic SVG text output

pub mod compose;
pub mod document;
mod serialize;

pub use compose::{ComposeOptions, LegacyQuirks, compose_layer};
pub use serialize::serialize;

use crate::geometry::GeometryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayerError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
}
