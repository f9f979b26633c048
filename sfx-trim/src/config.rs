//! Configuration for sfx-trim
//!
//! Bootstrap configuration loaded from an optional TOML file. Every field has a
//! built-in default, so an empty or missing file yields a working setup.
//!
//! Resolution order (see `sfx_common::config::resolve_config_file`):
//! 1. `--config <path>` on the command line
//! 2. `SFX_TRIM_CONFIG` environment variable
//! 3. `<platform config dir>/sfx/trim.toml`
//! 4. Built-in defaults
//!
//! ```toml
//! [trim]
//! min_length_secs = 0.1
//! debounce_ms = 300
//!
//! [encoder]
//! program = "ffmpeg"
//! bitrate_kbps = 128
//!
//! [logging]
//! level = "debug"
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use sfx_common::config::{load_toml, resolve_config_file, ConfigSource};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "SFX_TRIM_CONFIG";

/// Config file name inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "trim.toml";

/// Top-level TOML document
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub trim: TrimSettings,

    #[serde(default)]
    pub encoder: EncoderSettings,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Trim interaction and recompute settings
#[derive(Debug, Clone, Deserialize)]
pub struct TrimSettings {
    /// Shortest selectable region in seconds
    #[serde(default = "default_min_length_secs")]
    pub min_length_secs: f64,

    /// Quiet period after the last region change before recomputing
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Number of min/max peak pairs in the waveform overview
    #[serde(default = "default_waveform_buckets")]
    pub waveform_buckets: usize,

    /// Pointer distance (px) within which a handle is hit
    #[serde(default = "default_handle_tolerance_px")]
    pub handle_tolerance_px: f64,

    /// Pipeline event channel capacity
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

/// Distributable encoder settings
#[derive(Debug, Clone, Deserialize)]
pub struct EncoderSettings {
    /// Encoder executable (looked up on PATH unless absolute)
    #[serde(default = "default_encoder_program")]
    pub program: PathBuf,

    /// Constant bitrate in kbit/s
    #[serde(default = "default_bitrate_kbps")]
    pub bitrate_kbps: u32,

    /// Output channel count (1 = mono)
    #[serde(default = "default_output_channels")]
    pub channels: u8,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), overridden by RUST_LOG
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_min_length_secs() -> f64 {
    0.1
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_waveform_buckets() -> usize {
    800
}

fn default_handle_tolerance_px() -> f64 {
    6.0
}

fn default_event_capacity() -> usize {
    100
}

fn default_encoder_program() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_bitrate_kbps() -> u32 {
    128
}

fn default_output_channels() -> u8 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TrimSettings {
    fn default() -> Self {
        Self {
            min_length_secs: default_min_length_secs(),
            debounce_ms: default_debounce_ms(),
            waveform_buckets: default_waveform_buckets(),
            handle_tolerance_px: default_handle_tolerance_px(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            program: default_encoder_program(),
            bitrate_kbps: default_bitrate_kbps(),
            channels: default_output_channels(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TrimSettings {
    /// Debounce window as a Duration
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl TomlConfig {
    /// Resolve and load the config file, then validate it
    pub fn load(cli_path: Option<&Path>) -> Result<Self> {
        let source = resolve_config_file(cli_path, CONFIG_ENV_VAR, CONFIG_FILE_NAME);
        let config: TomlConfig = load_toml(&source)?;
        config.validate()?;

        match &source {
            ConfigSource::BuiltIn => info!("Using built-in configuration"),
            other => {
                if let Some(path) = other.path() {
                    info!(path = %path.display(), "Loaded configuration");
                }
            }
        }

        Ok(config)
    }

    /// Parse a config document directly (tests, embedded hosts)
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(text).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        let trim = &self.trim;
        if !trim.min_length_secs.is_finite() || trim.min_length_secs <= 0.0 {
            return Err(Error::Config(format!(
                "trim.min_length_secs must be positive, got {}",
                trim.min_length_secs
            )));
        }
        if trim.waveform_buckets == 0 {
            return Err(Error::Config("trim.waveform_buckets must be at least 1".to_string()));
        }
        if !trim.handle_tolerance_px.is_finite() || trim.handle_tolerance_px < 0.0 {
            return Err(Error::Config(format!(
                "trim.handle_tolerance_px must be non-negative, got {}",
                trim.handle_tolerance_px
            )));
        }
        if self.encoder.bitrate_kbps == 0 {
            return Err(Error::Config("encoder.bitrate_kbps must be positive".to_string()));
        }
        if !(1..=2).contains(&self.encoder.channels) {
            return Err(Error::Config(format!(
                "encoder.channels must be 1 or 2, got {}",
                self.encoder.channels
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert_eq!(config.trim.min_length_secs, 0.1);
        assert_eq!(config.trim.debounce(), Duration::from_millis(300));
        assert_eq!(config.encoder.bitrate_kbps, 128);
        assert_eq!(config.encoder.channels, 1);
        assert_eq!(config.encoder.program, PathBuf::from("ffmpeg"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = TomlConfig::from_toml_str(
            "[trim]\ndebounce_ms = 150\n\n[encoder]\nprogram = \"/usr/local/bin/ffmpeg\"\n",
        )
        .unwrap();
        assert_eq!(config.trim.debounce_ms, 150);
        assert_eq!(config.trim.min_length_secs, 0.1);
        assert_eq!(config.encoder.program, PathBuf::from("/usr/local/bin/ffmpeg"));
        assert_eq!(config.encoder.bitrate_kbps, 128);
    }

    #[test]
    fn test_rejects_non_positive_min_length() {
        let result = TomlConfig::from_toml_str("[trim]\nmin_length_secs = 0.0\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_zero_bitrate() {
        let result = TomlConfig::from_toml_str("[encoder]\nbitrate_kbps = 0\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_surround_output() {
        let result = TomlConfig::from_toml_str("[encoder]\nchannels = 6\n");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
