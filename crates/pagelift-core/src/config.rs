//! Configuration management for Pagelift.
//!
//! Parses `pagelift.toml` with serde, auto-discovering the file in the
//! input directory and its parents. Raw TOML values are relative strings;
//! path fields are resolved against the config file's directory after
//! loading.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::assets::AssetConfig;
use crate::embed::EmbedConfig;
use crate::error::ConfigError;

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "pagelift.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Embed resolution settings (raw).
    embed: EmbedSettingsRaw,
    /// Asset injection settings (raw, paths as strings).
    assets: AssetSettingsRaw,
    /// Version tag used as an output subdirectory.
    pub version_tag: Option<String>,
    /// Categories document, relative to the input directory.
    pub categories_file: Option<String>,

    /// Resolved embed settings (set after loading).
    #[serde(skip)]
    pub embed_resolved: EmbedConfig,
    /// Resolved asset settings (set after loading).
    #[serde(skip)]
    pub assets_resolved: AssetConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Raw embed settings as parsed from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct EmbedSettingsRaw {
    endpoint: Option<String>,
    height: Option<u32>,
    theme: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<usize>,
    pool_size: Option<usize>,
}

/// Raw asset settings as parsed from TOML (paths as strings).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct AssetSettingsRaw {
    base_path: Option<String>,
    css_dir: Option<String>,
    script_dir: Option<String>,
    post_body_script_dir: Option<String>,
}

impl Config {
    /// Load configuration.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise
    /// searches for [`CONFIG_FILENAME`] in `search_from` and its parents,
    /// falling back to defaults when nothing is found.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit `config_path` doesn't exist or
    /// parsing fails.
    pub fn load(config_path: Option<&Path>, search_from: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            return Self::load_from_file(path);
        }

        if let Some(discovered) = Self::discover(search_from) {
            return Self::load_from_file(&discovered);
        }

        Ok(Self::default())
    }

    /// Search for the config file in `start` and its parents.
    #[must_use]
    pub fn discover(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config: Self = toml::from_str(&content)?;

        let config_dir = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Fill the resolved settings from the raw TOML values.
    fn resolve(&mut self, base: &Path) {
        let defaults = EmbedConfig::default();
        self.embed_resolved = EmbedConfig {
            endpoint: self.embed.endpoint.clone().unwrap_or(defaults.endpoint),
            height: self.embed.height.unwrap_or(defaults.height),
            theme: self.embed.theme.clone(),
            timeout: self
                .embed
                .timeout_secs
                .map_or(defaults.timeout, std::time::Duration::from_secs),
            max_retries: self.embed.max_retries.unwrap_or(defaults.max_retries),
            pool_size: self.embed.pool_size.unwrap_or(defaults.pool_size),
        };

        self.assets_resolved = AssetConfig {
            base_path: self.assets.base_path.clone().unwrap_or_default(),
            css_dir: self.assets.css_dir.as_ref().map(|d| base.join(d)),
            script_dir: self.assets.script_dir.as_ref().map(|d| base.join(d)),
            post_body_script_dir: self
                .assets
                .post_body_script_dir
                .as_ref()
                .map(|d| base.join(d)),
        };
    }
}
