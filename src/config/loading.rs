//! Configuration loading.
//!
//! Resolves the config directory, creates a default `phlux.toml` on first
//! run, and parses and validates the file.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::Config;
use super::builder::create_default_config;
use super::validation::validate_config;
use crate::constants::*;

/// Locations of the files phlux reads and writes.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigPaths {
    dir: PathBuf,
}

impl ConfigPaths {
    /// Use `custom_dir` when given, otherwise `<config dir>/phlux`.
    pub fn resolve(custom_dir: Option<PathBuf>) -> Result<Self> {
        let dir = match custom_dir {
            Some(dir) => dir,
            None => dirs::config_dir()
                .context("Could not determine config directory")?
                .join(APP_NAME),
        };
        Ok(Self { dir })
    }

    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE_NAME)
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.dir.join(CREDENTIALS_FILE_NAME)
    }
}

/// Load `phlux.toml`, writing a default one first if it does not exist.
pub fn load(paths: &ConfigPaths) -> Result<Config> {
    let config_path = paths.config_file();

    if !config_path.exists() {
        create_default_config(&config_path)
            .context("Failed to create default config during load")?;
        log_indented!("Created default config at {}", config_path.display());
    }

    load_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))
}

/// Load and validate a config file. Does not create missing files.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", path.display()))?;

    validate_config(&config)?;

    Ok(config)
}
