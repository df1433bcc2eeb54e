//! Configuration management for curbside
//!
//! Config stored at: ~/.config/curbside/config.json

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use curbside_infra::StaticGeolocation;
use curbside_map::MapConfig;
use curbside_types::{ConfigError, OutputFormat, Result, Theme};

/// Pixel size of the headless map viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Truck dataset file (TOML, JSON or CSV). Built-in sample when unset.
    #[serde(default)]
    pub data_path: Option<PathBuf>,

    /// Store directory override
    #[serde(default)]
    pub store_dir: Option<PathBuf>,

    /// Default output format (json, table)
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,

    /// Basemap theme
    #[serde(default)]
    pub theme: Theme,

    #[serde(default)]
    pub viewport: ViewportSize,

    /// Answer given to location requests
    #[serde(default)]
    pub geolocation: StaticGeolocation,

    /// Clustering, paint, debounce and camera settings
    #[serde(default)]
    pub map: MapConfig,
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Table
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: None,
            store_dir: None,
            output_format: default_output_format(),
            theme: Theme::default(),
            viewport: ViewportSize::default(),
            geolocation: StaticGeolocation::default(),
            map: MapConfig::default(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NotFound)?.join("curbside");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Get the store directory path
    pub fn store_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.store_dir {
            return Ok(dir.clone());
        }

        let store_dir = dirs::data_dir().ok_or(ConfigError::NotFound)?.join("curbside");
        Ok(store_dir)
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveError(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.map
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(ConfigError::Invalid("viewport size must be non-zero".to_string()).into());
        }
        Ok(())
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Curbside Configuration")?;
        writeln!(f, "======================")?;
        writeln!(f)?;
        writeln!(
            f,
            "Dataset:        {}",
            self.data_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(built-in sample)".to_string())
        )?;
        writeln!(
            f,
            "Store dir:      {}",
            self.store_dir()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "(error)".to_string())
        )?;
        writeln!(f, "Output format:  {}", self.output_format)?;
        writeln!(f, "Theme:          {}", self.theme)?;
        writeln!(
            f,
            "Viewport:       {}x{} px",
            self.viewport.width, self.viewport.height
        )?;
        writeln!(f, "Permission:     {}", self.geolocation.permission)?;
        writeln!(
            f,
            "Position:       {}",
            self.geolocation
                .position
                .map(|p| p.to_string())
                .unwrap_or_else(|| "(none)".to_string())
        )?;
        writeln!(f)?;
        writeln!(
            f,
            "Clustering:     radius {} px, zoom {}-{}, min {} points",
            self.map.cluster.radius, self.map.cluster.min_zoom, self.map.cluster.max_zoom, self.map.cluster.min_points
        )?;
        writeln!(f, "Debounce:       {} ms", self.map.debounce_ms)?;
        writeln!(f, "Default camera: {}", self.map.default_camera)?;
        writeln!(f, "Locate zoom:    {}", self.map.locate_zoom)?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:    {}", path.display())?;
        }

        Ok(())
    }
}
