//! Imager configuration module.
//!
//! Handles loading, validating, and merging `imager.toml`. Stock defaults are
//! serialized to a TOML table, the user file is merged on top key by key, and
//! the result is deserialized and validated. A missing file means defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [limits]
//! max_buffer_pixels = 10000000  # Largest decoded image, in pixels
//! max_dimension = 16384         # Longest accepted side
//!
//! [output]
//! quality = 90                  # JPEG quality (1-100)
//!
//! [formats]
//! gif = "png"                   # Output format for GIF sources
//! indexed_png = "jpeg"          # Output format for paletted PNG sources
//! keep_alpha = true             # Never write JPEG for a transparent source
//!
//! [processing]
//! max_processes = 4             # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{
    EncodeParams, FormatPolicy, FormatTag, ImageOptions, Limits, Quality, admission,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `imager.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagerConfig {
    /// Admission limits applied before decode.
    pub limits: LimitsConfig,
    /// Encoder settings for derived images.
    pub output: OutputConfig,
    /// Input → output format table.
    pub formats: FormatPolicy,
    /// Parallel batch settings.
    pub processing: ProcessingConfig,
}

impl ImagerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.max_buffer_pixels == 0 {
            return Err(ConfigError::Validation(
                "limits.max_buffer_pixels must be non-zero".into(),
            ));
        }
        if self.limits.max_dimension < admission::MIN_SIDE {
            return Err(ConfigError::Validation(format!(
                "limits.max_dimension must be at least {}",
                admission::MIN_SIDE
            )));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if self.formats.gif == FormatTag::Unknown || self.formats.indexed_png == FormatTag::Unknown
        {
            return Err(ConfigError::Validation(
                "formats targets must be jpeg, png, or gif".into(),
            ));
        }
        Ok(())
    }

    /// Options for [`Image::with_options`](crate::imaging::Image::with_options).
    pub fn image_options(&self) -> ImageOptions {
        ImageOptions {
            limits: Limits::new(self.limits.max_buffer_pixels)
                .with_max_dimension(self.limits.max_dimension),
            policy: self.formats,
            encode: EncodeParams {
                quality: Quality::new(self.output.quality),
            },
        }
    }
}

/// Admission limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Largest accepted `width * height`, after orientation.
    pub max_buffer_pixels: u64,
    /// Longest accepted side, after orientation.
    pub max_dimension: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_buffer_pixels: 10_000_000,
            max_dimension: admission::DEFAULT_MAX_DIMENSION,
        }
    }
}

/// Encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// JPEG quality (1-100).
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default().value(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ImagerConfig::default()).expect("default config must serialize")
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

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ImagerConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ImagerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a file path, falling back to defaults when it is absent.
pub fn load_config(path: &Path) -> Result<ImagerConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    if overlay.is_some() {
        log::debug!("loaded config from {}", path.display());
    }
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `imager.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Imager Configuration
# ====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Admission limits (checked from the header, before any pixel is decoded)
# ---------------------------------------------------------------------------
[limits]
# Largest accepted width * height, measured after EXIF orientation.
max_buffer_pixels = 10000000

# Longest accepted side. Rejects extreme strips that are cheap in pixels
# but hostile to decoders.
max_dimension = 16384

# ---------------------------------------------------------------------------
# Output encoding
# ---------------------------------------------------------------------------
[output]
# JPEG quality (1 = worst, 100 = best). PNG and GIF are lossless.
quality = 90

# ---------------------------------------------------------------------------
# Output format table
# ---------------------------------------------------------------------------
# JPEG sources stay JPEG and truecolor PNG sources stay PNG.
[formats]
# Output for GIF sources: "png", "jpeg", or "gif".
gif = "png"

# Output for paletted PNG sources.
indexed_png = "jpeg"

# Write PNG instead of JPEG whenever the source has transparency.
keep_alpha = true

# ---------------------------------------------------------------------------
# Parallel batch processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of parallel workers. Omit to use all CPU cores.
# Values above the core count are clamped down.
# max_processes = 4
"##
}
