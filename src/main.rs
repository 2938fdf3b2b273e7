//! colorsilk - colorful silkscreen layers from board artwork.

mod cli;
mod config;
mod geometry;
mod layer;
mod logger;
mod outline;
mod package;
mod raster;
mod utils;

use clap::{ColorChoice, Parser};
use cli::{Cli, build::build_layers};
use config::Config;

fn main() {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => fail(err.into()),
    };
    if let Some(path) = &config.config_path {
        debug!("config"; "loaded {}", path.display());
    }

    if let Err(err) = build_layers(&cli, &config) {
        fail(err);
    }
}

/// Log the error chain and exit with status 1.
fn fail(err: anyhow::Error) -> ! {
    log!("error"; "{err}");
    for cause in err.chain().skip(1) {
        log!("error"; "  caused by: {cause}");
    }
    std::process::exit(1);
}
