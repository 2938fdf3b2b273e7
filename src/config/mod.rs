//! Tool configuration from `colorsilk.toml` and CLI flags.
//!
//! # Sections
//!
//! | Section           | Purpose                                         |
//! |-------------------|-------------------------------------------------|
//! | `[layer]`         | Clip tolerance                                  |
//! | `[layer.legacy]`  | Reference-tool output quirks                    |
//! | `[output]`        | Output directory and file names                 |
//! | `[package]`       | Public key override                             |
//!
//! The file is optional: without one, defaults apply. CLI flags override
//! file values.

mod error;
mod util;

pub use error::ConfigError;

use crate::cli::Cli;
use crate::geometry::Side;
use crate::layer::compose::CLIP_TOLERANCE;
use crate::layer::{ComposeOptions, LegacyQuirks};
use crate::log;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use util::find_config_file;

/// Config file looked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "colorsilk.toml";

// ============================================================================
// root configuration
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layer: LayerConfig,
    pub output: OutputConfig,
    pub package: PackageConfig,

    /// Config file this was loaded from, if any (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// `[layer]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    /// Clip inset/outset in drawing units.
    pub tolerance: f64,
    pub legacy: LegacyQuirks,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            tolerance: CLIP_TOLERANCE,
            legacy: LegacyQuirks::default(),
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub top_svg: String,
    pub bottom_svg: String,
    pub top_container: String,
    pub bottom_container: String,
    /// Copy the Gerber export next to the containers when `--gerber` is used.
    pub copy_gerber: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./out"),
            top_svg: "Top.svg".to_string(),
            bottom_svg: "Bottom.svg".to_string(),
            top_container: "Fabrication_ColorfulTopSilkscreen.FCTS".to_string(),
            bottom_container: "Fabrication_ColorfulBottomSilkscreen.FCBS".to_string(),
            copy_gerber: true,
        }
    }
}

impl OutputConfig {
    pub fn svg_path(&self, side: Side) -> PathBuf {
        self.dir.join(match side {
            Side::Top => &self.top_svg,
            Side::Bottom => &self.bottom_svg,
        })
    }

    pub fn container_path(&self, side: Side) -> PathBuf {
        self.dir.join(match side {
            Side::Top => &self.top_container,
            Side::Bottom => &self.bottom_container,
        })
    }
}

/// `[package]` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// PEM public key replacing the embedded vendor key.
    pub public_key: Option<PathBuf>,
}

impl Config {
    /// Load configuration and apply CLI overrides.
    ///
    /// An explicitly named config that does not exist is an error; the
    /// default name is looked up from the working directory upward.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|e| ConfigError::Io(PathBuf::from("."), e))?;
        let name = cli.config.as_deref().unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        let mut config = match find_config_file(name, &cwd) {
            Some(path) => Self::from_path(&path)?,
            None if cli.config.is_some() => {
                return Err(ConfigError::Io(
                    name.to_path_buf(),
                    std::io::Error::from(std::io::ErrorKind::NotFound),
                ));
            }
            None => Self::default(),
        };

        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            log!("warning"; "unknown fields in {}: {}", path.display(), ignored.join(", "));
        }

        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(out) = &cli.out {
            self.output.dir = out.clone();
        }
        if let Some(key) = &cli.public_key {
            self.package.public_key = Some(key.clone());
        }
        if cli.legacy {
            self.layer.legacy = LegacyQuirks::ALL;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let tolerance = self.layer.tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ConfigError::Validation(format!(
                "[layer] tolerance must be a non-negative number, got {tolerance}"
            )));
        }

        let out = &self.output;
        let names = [&out.top_svg, &out.bottom_svg, &out.top_container, &out.bottom_container];
        if names.iter().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::Validation("[output] file names must not be empty".into()));
        }
        if out.top_svg == out.bottom_svg || out.top_container == out.bottom_container {
            return Err(ConfigError::Validation(
                "[output] top and bottom file names must differ".into(),
            ));
        }
        Ok(())
    }

    pub fn compose_options(&self) -> ComposeOptions {
        ComposeOptions {
            tolerance: self.layer.tolerance,
            quirks: self.layer.legacy,
        }
    }
}

// ============================================================================
// tests
// ============================================================================
