use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_layout")]
    pub default_layout: String,
    #[serde(default = "default_lesson")]
    pub default_lesson: String,
    #[serde(default = "default_shape")]
    pub default_shape: String,
    /// Directory searched for `layouts/` and `lessons/` before the bundled set.
    #[serde(default = "default_definitions_dir")]
    pub definitions_dir: String,
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
    #[serde(default = "default_key_pulse_ms")]
    pub key_pulse_ms: u64,
    #[serde(default = "default_error_flash_ms")]
    pub error_flash_ms: u64,
    /// Base URL for definitions not found locally (requires the `network` feature).
    #[serde(default)]
    pub remote_base_url: Option<String>,
    #[serde(default = "default_definitions_cache_dir")]
    pub definitions_cache_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_theme() -> String {
    "terminal-default".to_string()
}
fn default_layout() -> String {
    "qwerty".to_string()
}
fn default_lesson() -> String {
    "english".to_string()
}
fn default_shape() -> String {
    "pc104".to_string()
}
fn default_definitions_dir() -> String {
    data_dir().join("definitions").to_string_lossy().to_string()
}
fn default_tick_rate_ms() -> u64 {
    50
}
fn default_key_pulse_ms() -> u64 {
    150
}
fn default_error_flash_ms() -> u64 {
    150
}
fn default_definitions_cache_dir() -> String {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("typist")
        .join("definitions")
        .to_string_lossy()
        .to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

/// Per-user data directory holding settings, logs and user definitions.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("typist")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            default_layout: default_layout(),
            default_lesson: default_lesson(),
            default_shape: default_shape(),
            definitions_dir: default_definitions_dir(),
            tick_rate_ms: default_tick_rate_ms(),
            key_pulse_ms: default_key_pulse_ms(),
            error_flash_ms: default_error_flash_ms(),
            remote_base_url: None,
            definitions_cache_dir: default_definitions_cache_dir(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("typist")
            .join("config.toml")
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms.max(1))
    }

    pub fn key_pulse(&self) -> Duration {
        Duration::from_millis(self.key_pulse_ms)
    }

    pub fn error_flash(&self) -> Duration {
        Duration::from_millis(self.error_flash_ms)
    }

    /// Empty strings in the remote URL are treated as unset.
    pub fn remote_base_url(&self) -> Option<&str> {
        self.remote_base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}
