//! Relay daemon configuration.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/reelcast/relayd.toml`
//! - Windows: `%APPDATA%/reelcast/relayd.toml`
//!
//! `REELCAST_CONFIG` overrides the path.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Relay daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listen address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port (0 = auto-assign).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Content root scanned for game asset folders.
    #[serde(default = "default_content_root")]
    pub content_root: String,

    /// Game id used when a manifest is requested without one.
    #[serde(default = "default_game")]
    pub default_game: String,
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    17311
}

fn default_content_root() -> String {
    "Assets".into()
}

fn default_game() -> String {
    "ApexLegends".into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            content_root: default_content_root(),
            default_game: default_game(),
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path();

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Saves the current configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = config_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the configuration file path.
fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("REELCAST_CONFIG") {
        return PathBuf::from(path);
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("reelcast").join("relayd.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("reelcast")
            .join("relayd.toml")
    }
}
