//! Mirror configuration.
//!
//! Every option has a stock default, so the program runs with no
//! configuration at all. Values are layered:
//!
//! ```text
//! stock defaults  ←  --config FILE (TOML)  ←  command-line flags
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [images]
//! max_pixels = 1920         # Longer-edge limit; larger images are downscaled
//! quality = 80              # JPEG quality (1-100)
//!
//! [scan]
//! extensions = ["jpg", "jpeg", "bmp", "png"]   # Matched case-insensitively
//!
//! [watch]
//! interval_secs = 300       # Repeat the pass every N seconds (omit for one pass)
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use crate::imaging::{DEFAULT_MAX_PIXELS, Quality, TranscodeConfig, decodable_extensions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Complete mirror configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MirrorConfig {
    /// Output image settings (size limit, quality).
    pub images: ImagesConfig,
    /// Which source files are picked up.
    pub scan: ScanConfig,
    /// Repeat-pass settings.
    pub watch: WatchConfig,
}

impl MirrorConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.max_pixels == 0 {
            return Err(ConfigError::Validation(
                "images.max_pixels must be greater than 0".into(),
            ));
        }
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.scan.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "scan.extensions must not be empty".into(),
            ));
        }
        let decodable = decodable_extensions();
        for ext in self.scan.normalized_extensions() {
            if !decodable.contains(&ext.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "scan.extensions: no decoder for '{ext}' (supported: {})",
                    decodable.join(", ")
                )));
            }
        }
        if self.watch.interval_secs == Some(0) {
            return Err(ConfigError::Validation(
                "watch.interval_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Encoder settings for the imaging layer.
    pub fn transcode(&self) -> TranscodeConfig {
        TranscodeConfig {
            max_pixels: self.images.max_pixels,
            quality: Quality::new(self.images.quality),
        }
    }
}

/// Output image settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Maximum size of the longer edge in pixels.
    pub max_pixels: u32,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_pixels: DEFAULT_MAX_PIXELS,
            quality: Quality::default().value(),
        }
    }
}

/// Source file selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// File extensions to convert, with or without a leading dot.
    pub extensions: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: ["jpg", "jpeg", "bmp", "png"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl ScanConfig {
    /// Extensions lowercased with any leading dot removed.
    pub fn normalized_extensions(&self) -> Vec<String> {
        self.extensions
            .iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect()
    }
}

/// Repeat-pass settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Seconds to wait between passes. `None` runs a single pass.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_secs: Option<u64>,
}

impl WatchConfig {
    pub fn interval(&self) -> Option<Duration> {
        self.interval_secs.map(Duration::from_secs)
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(MirrorConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<MirrorConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: MirrorConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from an optional TOML file.
///
/// With no path the stock defaults are returned. A path that does not exist
/// is an error: it was asked for explicitly.
pub fn load_config(path: Option<&Path>) -> Result<MirrorConfig, ConfigError> {
    let overlay = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            Some(toml::from_str::<toml::Value>(&content)?)
        }
        None => None,
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `--gen-config` flag.
pub fn stock_config_toml() -> &'static str {
    r##"# image-mirror configuration
# ==========================
#
# All options are optional. Values shown are the defaults.
# Pass this file with --config; command-line flags override it.

[images]
# Longer-edge limit in pixels. Wider-than-tall images are scaled to this
# width, taller-than-wide images to this height. Smaller images are never
# upscaled.
max_pixels = 1920
# JPEG quality, 1 (smallest) to 100 (best).
quality = 80

[scan]
# Source file extensions to convert, matched case-insensitively.
# Available decoders: jpg, jpeg, png, bmp.
extensions = ["jpg", "jpeg", "bmp", "png"]

[watch]
# Repeat the sync pass every N seconds until cancelled.
# Omit to run a single pass.
# interval_secs = 300
"##
}
