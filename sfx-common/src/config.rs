//! Configuration file resolution and TOML loading
//!
//! Config files are optional. Every loader falls back to built-in defaults
//! when no file is found, so a fresh install runs without any setup.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where a resolved configuration file came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicit command-line argument
    CommandLine(PathBuf),
    /// Environment variable
    Environment(PathBuf),
    /// Platform config directory (e.g. `~/.config/sfx/<file>`)
    PlatformDefault(PathBuf),
    /// No file found, built-in defaults apply
    BuiltIn,
}

impl ConfigSource {
    /// Path of the file to read, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::CommandLine(p)
            | ConfigSource::Environment(p)
            | ConfigSource::PlatformDefault(p) => Some(p),
            ConfigSource::BuiltIn => None,
        }
    }
}

/// Config file resolution in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. `<platform config dir>/sfx/<file_name>` if it exists
/// 4. Built-in defaults
///
/// An explicit path (CLI or environment) is returned even if it does not exist,
/// so that loading reports the missing file instead of silently using defaults.
pub fn resolve_config_file(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_name: &str,
) -> ConfigSource {
    if let Some(path) = cli_arg {
        return ConfigSource::CommandLine(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return ConfigSource::Environment(PathBuf::from(path));
        }
    }

    if let Some(path) = platform_config_path(file_name) {
        if path.exists() {
            return ConfigSource::PlatformDefault(path);
        }
    }

    ConfigSource::BuiltIn
}

/// Platform-specific location for an SFX config file
///
/// - Linux: `~/.config/sfx/<file>`
/// - macOS: `~/Library/Application Support/sfx/<file>`
/// - Windows: `%APPDATA%\sfx\<file>`
pub fn platform_config_path(file_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sfx").join(file_name))
}

/// Load a TOML config of type `T` from the resolved source.
///
/// `ConfigSource::BuiltIn` yields `T::default()`.
pub fn load_toml<T>(source: &ConfigSource) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = source.path() else {
        debug!("No config file found, using built-in defaults");
        return Ok(T::default());
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;

    let config = toml::from_str(&content).map_err(|source| Error::Toml {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), "Loaded config file");
    Ok(config)
}
