use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::consts::DEFAULT_WEATHER_NAME;

/// Settings captured for one configured location.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EntrySettings {
    pub weather_name: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// JSON dump of collector data read by `bom-weather show`.
    pub snapshot_path: Option<PathBuf>,

    /// Values recorded when the location was first set up.
    ///
    /// Example TOML:
    /// [data]
    /// weather_name = "Brisbane"
    #[serde(default)]
    pub data: EntrySettings,

    /// Later edits; these win over `data`.
    #[serde(default)]
    pub options: EntrySettings,
}

impl Config {
    /// Location name: options first, then data, then "Home".
    pub fn location_name(&self) -> &str {
        self.options
            .weather_name
            .as_deref()
            .or(self.data.weather_name.as_deref())
            .unwrap_or(DEFAULT_WEATHER_NAME)
    }

    /// Record a location name. The first name becomes the entry data,
    /// later ones are stored as options.
    pub fn set_weather_name(&mut self, name: String) {
        if self.data.weather_name.is_none() {
            self.data.weather_name = Some(name);
        } else {
            self.options.weather_name = Some(name);
        }
    }

    pub fn snapshot_path(&self) -> Result<&Path> {
        self.snapshot_path.as_deref().ok_or_else(|| {
            anyhow!(
                "No collector snapshot configured.\n\
                 Hint: run `bom-weather configure` or pass `--snapshot <file>`."
            )
        })
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "saved configuration");

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "bom-weather", "bom-weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
