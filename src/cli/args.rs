//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Convert board artwork into encrypted colorful silkscreen layers
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,

    /// Artwork for the top silkscreen
    #[arg(short = 't', long = "top-image", value_hint = clap::ValueHint::FilePath)]
    pub top_image: PathBuf,

    /// Artwork for the bottom silkscreen, as seen from outside the board
    #[arg(short = 'b', long = "bottom-image", value_hint = clap::ValueHint::FilePath)]
    pub bottom_image: PathBuf,

    /// Output directory [default: ./out]
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub out: Option<PathBuf>,

    /// Gerber export directory containing `Gerber_BoardOutlineLayer.GKO`
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub gerber: Option<PathBuf>,

    /// Board outline Gerber file (used when --gerber is not given)
    #[arg(short = 'k', long, value_hint = clap::ValueHint::FilePath)]
    pub outline: Option<PathBuf>,

    /// Config file path [default: colorsilk.toml, searched upward]
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// PEM public key replacing the embedded fabrication-house key
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub public_key: Option<PathBuf>,

    /// Enable all reference-tool output quirks (see `[layer.legacy]`)
    #[arg(long)]
    pub legacy: bool,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    pub verbose: bool,
}
