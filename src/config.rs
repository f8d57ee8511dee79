//! boxcat configuration.
//!
//! Three layers, lowest precedence first: built-in defaults, an optional
//! TOML config file (`boxcat.toml` in the working directory unless a path
//! is given), and CLI flag overrides.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Default config file path, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "boxcat.toml";

/// Default catalog name.
pub const DEFAULT_CATALOG_NAME: &str = "boxes";

/// Default key prefix under which boxes are listed.
pub const DEFAULT_PREFIX: &str = "boxes/";

/// Default manifest key.
pub const DEFAULT_MANIFEST_KEY: &str = "boxes.json";

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no store root configured; set store_root in boxcat.toml or pass --store-root")]
    MissingStoreRoot,
}

/// File-level configuration; every field is optional in TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Root directory of the filesystem store.
    pub store_root: Option<PathBuf>,

    /// URL prefix for resolved object URLs.
    pub base_url: Option<String>,

    /// Catalog identifier written into the manifest.
    pub catalog_name: Option<String>,

    /// Key prefix under which boxes are listed.
    pub prefix: Option<String>,

    /// Key of the published manifest.
    pub manifest_key: Option<String>,
}

impl ConfigFile {
    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

/// CLI flag overrides, highest precedence.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub store_root: Option<PathBuf>,
    pub base_url: Option<String>,
}

/// Effective configuration for a run.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_root: PathBuf,
    pub base_url: Option<String>,
    pub catalog_name: String,
    pub prefix: String,
    pub manifest_key: String,
}

impl Config {
    /// Resolve the effective config from an optional file path and CLI
    /// overrides.
    ///
    /// An explicitly given file path must exist; the default path is used
    /// only when present.
    pub fn load(file_path: Option<&Path>, overrides: Overrides) -> Result<Self, ConfigError> {
        let file = match file_path {
            Some(path) => ConfigFile::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    ConfigFile::from_file(default)?
                } else {
                    ConfigFile::default()
                }
            }
        };

        let store_root = overrides
            .store_root
            .or(file.store_root)
            .ok_or(ConfigError::MissingStoreRoot)?;

        Ok(Self {
            store_root,
            base_url: overrides.base_url.or(file.base_url),
            catalog_name: file
                .catalog_name
                .unwrap_or_else(|| DEFAULT_CATALOG_NAME.to_string()),
            prefix: file.prefix.unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            manifest_key: file
                .manifest_key
                .unwrap_or_else(|| DEFAULT_MANIFEST_KEY.to_string()),
        })
    }
}
