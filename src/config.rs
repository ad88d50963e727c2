//! Reducer configuration module.
//!
//! Handles loading, validating, and merging `photo-reducer.toml`. Stock
//! defaults are overridden by the user file, and command-line flags override
//! both (that last step happens in the binary).
//!
//! ## Config File Location
//!
//! ```text
//! photos/
//! ├── photo-reducer.toml       # Picked up automatically
//! ├── IMG_0001.jpg
//! └── ...
//! ```
//!
//! Any other file can be passed with `--config <file>`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional
//!
//! max_size_mib = 2.5        # Target size per photo, in MiB (no default)
//!
//! [output]
//! dir_name = "reduced_photos"
//!
//! [extensions]
//! names = ["jpg", "JPG", "jpeg", "JPEG", "png", "PNG"]
//! ignore_case = false
//!
//! [processing]
//! max_processes = 1         # Photos reduced at once
//! ```
//!
//! Config files are sparse: override just the values you want. Unknown keys
//! are rejected to catch typos early.

use crate::scan::ExtensionSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File name looked up in the source directory.
pub const CONFIG_FILE_NAME: &str = "photo-reducer.toml";

/// Bytes per MiB, the unit the target size is entered in.
pub const BYTES_PER_MIB: f64 = 1_048_576.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Reducer configuration loaded from `photo-reducer.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ReducerConfig {
    /// Maximum size of each output file, in MiB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size_mib: Option<f64>,
    pub output: OutputConfig,
    pub extensions: ExtensionSet,
    pub processing: ProcessingConfig,
}

impl ReducerConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(mib) = self.max_size_mib {
            mib_to_bytes(mib)?;
        }
        let name = self.output.dir_name.as_str();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "output.dir_name must be a plain directory name, got {name:?}"
            )));
        }
        if self.extensions.names.is_empty() {
            return Err(ConfigError::Validation(
                "extensions.names must not be empty".into(),
            ));
        }
        if let Some(bad) = self
            .extensions
            .names
            .iter()
            .find(|n| n.is_empty() || n.starts_with('.'))
        {
            return Err(ConfigError::Validation(format!(
                "extensions.names entries are bare extensions without a dot, got {bad:?}"
            )));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Target size in bytes, if one is configured.
    pub fn target_max_bytes(&self) -> Result<Option<u64>, ConfigError> {
        self.max_size_mib.map(mib_to_bytes).transpose()
    }
}

/// Where reduced photos go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory created inside the source directory.
    pub dir_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir_name: crate::process::DEFAULT_OUTPUT_DIR_NAME.to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of photos reduced at once.
    /// When absent, photos are reduced one at a time.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective worker count from config.
///
/// - `None` → 1 (sequential)
/// - `Some(n)` → `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.clamp(1, cores)).unwrap_or(1)
}

/// Convert a size in MiB to whole bytes, truncating.
///
/// Rejects values that are not finite, not positive, or that truncate to
/// zero bytes.
pub fn mib_to_bytes(mib: f64) -> Result<u64, ConfigError> {
    if !mib.is_finite() || mib <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "max size must be a positive number of MiB, got {mib}"
        )));
    }
    // `as` saturates at u64::MAX for out-of-range floats.
    let bytes = (mib * BYTES_PER_MIB).trunc() as u64;
    if bytes == 0 {
        return Err(ConfigError::Validation(format!(
            "max size of {mib} MiB is less than one byte"
        )));
    }
    Ok(bytes)
}

/// Stock defaults as a TOML value, the base every overlay merges onto.
pub fn stock_defaults_value() -> toml::Value {
    // Serializing a plain struct of strings, bools and integers cannot fail.
    toml::Value::try_from(ReducerConfig::default())
        .unwrap_or_else(|_| toml::Value::Table(toml::map::Map::new()))
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
) -> Result<ReducerConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ReducerConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `photo-reducer.toml` from the given source directory.
///
/// A missing file yields the stock defaults.
pub fn load_config(source_dir: &Path) -> Result<ReducerConfig, ConfigError> {
    load_config_file(&source_dir.join(CONFIG_FILE_NAME))
}

/// Load an explicit config file. A missing file yields the stock defaults.
pub fn load_config_file(path: &Path) -> Result<ReducerConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `photo-reducer.toml`.
///
/// Used by the `gen-config` CLI command. The extension list shown is the
/// default for the platform the binary was built for.
pub fn stock_config_toml() -> String {
    let extensions = ExtensionSet::platform_default();
    let names = extensions
        .names
        .iter()
        .map(|n| format!("{n:?}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r##"# Photo Reducer Configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Place this file in the photo directory as {CONFIG_FILE_NAME},
# or pass it with --config. Command-line flags override these values.
# Unknown keys will cause an error.

# Maximum size of each reduced photo, in MiB (1 MiB = 1048576 bytes).
# Required either here or as --max-size.
# max_size_mib = 1.0

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Directory created inside the photo directory. Existing files in it are
# overwritten.
dir_name = "{dir_name}"

# ---------------------------------------------------------------------------
# Eligible files
# ---------------------------------------------------------------------------
[extensions]
# Extensions without the dot. Photos are processed grouped in this order.
names = [{names}]

# Match extensions ignoring upper/lower case.
ignore_case = {ignore_case}

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Photos reduced at once. Omit to reduce one at a time.
# Values above the CPU core count are clamped down.
# max_processes = 4
"##,
        dir_name = crate::process::DEFAULT_OUTPUT_DIR_NAME,
        ignore_case = extensions.ignore_case,
    )
}
