//! Configuration file support.
//!
//! Loads `.compendium/config.toml` (or the `--config` path). Values resolve
//! CLI flag > config file > built-in default. Relative paths are taken
//! relative to the working directory.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DIR: &str = ".compendium";
pub const DEFAULT_VERSIONS_DIR: &str = ".compendium/versions";
pub const DEFAULT_BLOCKS_PATH: &str = ".compendium/blocks.jsonl";
pub const DEFAULT_LOG: &str = "info";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory of numbered document versions
    pub versions_dir: Option<String>,

    /// Block source JSONL
    pub blocks_path: Option<String>,

    /// Title line seeded into the first version
    pub title: Option<String>,

    /// Default tracing filter, e.g. `info` or `compendium_kernel=debug`
    pub log: Option<String>,
}

impl Config {
    /// Load config from `path`; a missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn versions_dir(&self, flag: Option<&str>) -> PathBuf {
        resolve(flag, self.versions_dir.as_deref(), DEFAULT_VERSIONS_DIR)
    }

    pub fn blocks_path(&self, flag: Option<&str>) -> PathBuf {
        resolve(flag, self.blocks_path.as_deref(), DEFAULT_BLOCKS_PATH)
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Filter used when `RUST_LOG` is unset.
    pub fn log_filter(&self, verbose: bool) -> &str {
        if verbose {
            return "debug";
        }
        self.log.as_deref().unwrap_or(DEFAULT_LOG)
    }
}

fn resolve(flag: Option<&str>, configured: Option<&str>, default: &str) -> PathBuf {
    PathBuf::from(flag.or(configured).unwrap_or(default))
}

/// Config file written by `compendium init`.
pub fn default_config_toml() -> String {
    format!(
        "# compendium configuration\n\
         versions_dir = \"{DEFAULT_VERSIONS_DIR}\"\n\
         blocks_path = \"{DEFAULT_BLOCKS_PATH}\"\n\
         # title = \"My document\"\n\
         # log = \"{DEFAULT_LOG}\"\n"
    )
}
