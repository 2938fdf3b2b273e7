//! Layer generation pipeline.
//!
//! Pipeline phases:
//! - **Outline** - Resolve the outline source and read the board geometry
//! - **Compose** - Load, compose and serialize both sides (parallel)
//! - **Package** - Seal both documents into vendor containers
//! - **Write** - SVG documents and containers
//! - **Finalize** - Copy the Gerber export, logging
//!
//! Nothing is written until both sides have been composed and sealed, so a
//! failing outline, image or key leaves the output directory untouched.

use crate::{
    cli::Cli,
    config::Config,
    debug,
    geometry::{BoardGeometry, Side},
    layer::{ComposeOptions, compose_layer, serialize},
    log,
    logger::ProgressLine,
    outline::{OutlineProvider, OutlineSource},
    package::{Packager, load_public_key},
    raster::RasterImageRef,
    utils::fs::{copy_dir_recursively, normalize_path},
};
use anyhow::{Context, Result};
use std::{fs, path::Path};

/// Generate both silkscreen layers and their containers.
pub fn build_layers(cli: &Cli, config: &Config) -> Result<()> {
    // Outline
    let source = OutlineSource::resolve(cli.gerber.as_deref(), cli.outline.as_deref())?;
    log!("outline"; "{}", source.path.display());
    let geometry = source
        .provider()
        .board_geometry()
        .with_context(|| format!("failed to read board outline {}", source.path.display()))?;
    log!("outline"; "board {geometry}");

    // Fail on a bad key before doing any image work
    let public_key = load_public_key(config.package.public_key.as_deref())?;
    let packager = Packager::new(&public_key)?;

    let progress = ProgressLine::new(&[("layer", Side::ALL.len()), ("package", Side::ALL.len())]);

    // Compose (parallel)
    let options = config.compose_options();
    let (top, bottom) = rayon::join(
        || render_side(&geometry, &cli.top_image, Side::Top, &options, &progress),
        || render_side(&geometry, &cli.bottom_image, Side::Bottom, &options, &progress),
    );
    let documents = [(Side::Top, top?), (Side::Bottom, bottom?)];

    // Package
    let mut outputs = Vec::with_capacity(2 * documents.len());
    for (side, svg) in documents {
        let container = packager.seal(svg.as_bytes())?;
        progress.inc("package");
        outputs.push((config.output.svg_path(side), svg.into_bytes()));
        outputs.push((config.output.container_path(side), container));
    }

    // Write
    let out = &config.output;
    fs::create_dir_all(&out.dir)
        .with_context(|| format!("failed to create output directory {}", out.dir.display()))?;
    for (path, bytes) in &outputs {
        fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
        debug!("write"; "{}", path.display());
    }
    progress.finish();

    // Finalize
    if out.copy_gerber
        && let Some(gerber_dir) = &source.gerber_dir
    {
        copy_gerber(gerber_dir, &out.dir)?;
    }

    log!("done"; "layers written to {}", out.dir.display());
    Ok(())
}

/// Load, compose and serialize one side.
fn render_side(
    geometry: &BoardGeometry,
    image_path: &Path,
    side: Side,
    options: &ComposeOptions,
    progress: &ProgressLine,
) -> Result<String> {
    let image = RasterImageRef::load(image_path)?;
    debug!("layer"; "{side}: {}x{} {}", image.pixel_width, image.pixel_height, image.media_type);

    let document = compose_layer(geometry, &image, side, options)
        .with_context(|| format!("failed to compose {side} layer"))?;
    let (min_x, max_x) = document.artwork_span();
    debug!("layer"; "{side}: artwork spans x [{min_x:.3}, {max_x:.3}]");
    let svg = serialize(&document)?;
    progress.inc("layer");
    Ok(svg)
}

/// Copy the Gerber export next to the containers.
///
/// Skipped when the output directory lives inside the export, which would
/// otherwise copy the export into itself.
fn copy_gerber(gerber_dir: &Path, out_dir: &Path) -> Result<()> {
    let (src, dst) = (normalize_path(gerber_dir), normalize_path(out_dir));
    if dst.starts_with(&src) {
        log!("warning"; "output is inside {}, not copying gerber files", gerber_dir.display());
        return Ok(());
    }

    let copied = copy_dir_recursively(&src, &dst)?;
    log!("gerber"; "copied {copied} files from {}", gerber_dir.display());
    Ok(())
}
