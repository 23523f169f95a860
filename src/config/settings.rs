//! Application and widget configuration

use anyhow::{Context, Result};
use bg_widget_core::DEFAULT_REFRESH_INTERVAL;
use bg_widget_types::WidgetAppearance;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How snapshots are written out
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Application-wide configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Version of the config format
    pub version: u32,
    /// Seconds between timer-driven refreshes
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// Provider state file read on every tick
    #[serde(default)]
    pub state_file: Option<PathBuf>,
    #[serde(default)]
    pub output: OutputFormat,
    /// Widget instances to refresh
    #[serde(default = "default_widgets")]
    pub widgets: Vec<WidgetConfig>,
}

fn default_refresh_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL.as_secs()
}

fn default_widgets() -> Vec<WidgetConfig> {
    vec![WidgetConfig::default()]
}

impl AppConfig {
    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from_path(&config_path)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to_path(&config_path)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("org", "bg-widget", "bg-widget")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.json"))
    }

    /// Load configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a specific file path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config {}", path.display()))?;
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn widget_ids(&self) -> Vec<u32> {
        self.widgets.iter().map(|w| w.id).collect()
    }

    /// Appearance settings keyed by widget id
    pub fn appearances(&self) -> HashMap<u32, WidgetAppearance> {
        self.widgets.iter().map(|w| (w.id, w.appearance)).collect()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            refresh_interval_secs: default_refresh_interval_secs(),
            state_file: None,
            output: OutputFormat::default(),
            widgets: default_widgets(),
        }
    }
}

/// One widget instance
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct WidgetConfig {
    pub id: u32,
    #[serde(flatten)]
    pub appearance: WidgetAppearance,
}
