//! Player configuration for stemmix-player
//!
//! Configuration is stored as YAML in the user's config directory.
//! Default location: ~/.config/stemmix/config.yaml

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Base URL of the mix metadata service
    pub service_url: String,
    /// Where exported mixes are written; None means the OS download dir
    pub download_dir: Option<PathBuf>,
    /// Playback position refresh interval in milliseconds
    pub tick_interval_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8000/api/mix/dynamic".to_string(),
            download_dir: None,
            tick_interval_ms: 100,
        }
    }
}

/// Get the default config file path
///
/// Returns: ~/.config/stemmix/config.yaml
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stemmix")
        .join("config.yaml")
}

/// Load configuration from a YAML file
///
/// If the file doesn't exist, returns default config.
/// If the file exists but is invalid, logs a warning and returns defaults.
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    log::info!("load_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: Config file doesn't exist, using defaults");
        return T::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<T>(&contents) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("load_config: Failed to parse config: {}, using defaults", e);
                T::default()
            }
        },
        Err(e) => {
            log::warn!("load_config: Failed to read config file: {}, using defaults", e);
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_nonexistent_returns_default() {
        let config: PlayerConfig = load_config(Path::new("/nonexistent/path/config.yaml"));
        assert_eq!(config.service_url, PlayerConfig::default().service_url);
        assert_eq!(config.tick_interval_ms, 100);
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = PlayerConfig::default();
        config.service_url = "http://example.com/api".to_string();
        config.tick_interval_ms = 250;
        std::fs::write(&path, serde_yaml::to_string(&config).unwrap()).unwrap();

        let loaded: PlayerConfig = load_config(&path);
        assert_eq!(loaded.service_url, "http://example.com/api");
        assert_eq!(loaded.tick_interval_ms, 250);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "service_url: http://partial/\n").unwrap();

        let loaded: PlayerConfig = load_config(&path);
        assert_eq!(loaded.service_url, "http://partial/");
        assert_eq!(loaded.tick_interval_ms, 100);
    }
}
