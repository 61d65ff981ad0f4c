//! Keybindings configuration for stemmix-player
//!
//! Configurable keyboard shortcuts stored in YAML format.
//! Default location: ~/.config/stemmix/keybindings.yaml
//!
//! Defaults match the mixer's fixed surface: digits 1-5 mute parts
//! 1-5 in vocabulary order, Q/W/E/R/T solo them, Space toggles
//! play/pause. Solo keys are matched without modifiers — a held
//! Ctrl/Cmd/Shift switches the solo from exclusive to additive
//! instead of forming a different binding.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root keybindings configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeybindingsConfig {
    /// Keybindings for the mixer view
    pub mixer: MixerKeybindings,
}

/// Keybindings for the mixer view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerKeybindings {
    /// Play/pause toggle
    pub play_pause: Vec<String>,
    /// Mute toggles for parts 1-5 (vocabulary order)
    pub mute_part_1: Vec<String>,
    pub mute_part_2: Vec<String>,
    pub mute_part_3: Vec<String>,
    pub mute_part_4: Vec<String>,
    pub mute_part_5: Vec<String>,
    /// Solo toggles for parts 1-5 (vocabulary order)
    pub solo_part_1: Vec<String>,
    pub solo_part_2: Vec<String>,
    pub solo_part_3: Vec<String>,
    pub solo_part_4: Vec<String>,
    pub solo_part_5: Vec<String>,
}

impl Default for MixerKeybindings {
    fn default() -> Self {
        Self {
            play_pause: vec!["Space".into()],
            mute_part_1: vec!["1".into()],
            mute_part_2: vec!["2".into()],
            mute_part_3: vec!["3".into()],
            mute_part_4: vec!["4".into()],
            mute_part_5: vec!["5".into()],
            solo_part_1: vec!["q".into()],
            solo_part_2: vec!["w".into()],
            solo_part_3: vec!["e".into()],
            solo_part_4: vec!["r".into()],
            solo_part_5: vec!["t".into()],
        }
    }
}

/// Get the default keybindings file path
///
/// Returns: ~/.config/stemmix/keybindings.yaml
pub fn default_keybindings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stemmix")
        .join("keybindings.yaml")
}

/// Load keybindings from a YAML file
///
/// If the file doesn't exist, returns default keybindings.
/// If the file exists but is invalid, logs a warning and returns defaults.
pub fn load_keybindings(path: &Path) -> KeybindingsConfig {
    if !path.exists() {
        return KeybindingsConfig::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<KeybindingsConfig>(&contents) {
            Ok(config) => {
                log::info!("load_keybindings: Loaded custom keybindings from {:?}", path);
                config
            }
            Err(e) => {
                log::warn!("load_keybindings: Failed to parse: {}, using defaults", e);
                KeybindingsConfig::default()
            }
        },
        Err(e) => {
            log::warn!("load_keybindings: Failed to read file: {}, using defaults", e);
            KeybindingsConfig::default()
        }
    }
}

/// Convert an iced keyboard key to a modifier-free string for matching.
///
/// Character keys are lowercased so `Q` and `q` hit the same binding;
/// modifier state is handled separately by the caller (it changes solo
/// exclusivity, not the binding).
pub fn key_to_string(key: &iced::keyboard::Key) -> String {
    use iced::keyboard::{key::Named, Key};

    match key {
        Key::Named(Named::Space) => "Space".to_string(),
        Key::Character(c) => c.to_lowercase(),
        _ => String::new(),
    }
}

impl MixerKeybindings {
    /// Check if a key matches any mute binding and return the part
    /// index (0-4, vocabulary order)
    pub fn match_mute_part(&self, key_str: &str) -> Option<usize> {
        let bindings = [
            &self.mute_part_1,
            &self.mute_part_2,
            &self.mute_part_3,
            &self.mute_part_4,
            &self.mute_part_5,
        ];
        for (i, binding) in bindings.iter().enumerate() {
            if binding.iter().any(|b| b == key_str) {
                return Some(i);
            }
        }
        None
    }

    /// Check if a key matches any solo binding and return the part
    /// index (0-4, vocabulary order)
    pub fn match_solo_part(&self, key_str: &str) -> Option<usize> {
        let bindings = [
            &self.solo_part_1,
            &self.solo_part_2,
            &self.solo_part_3,
            &self.solo_part_4,
            &self.solo_part_5,
        ];
        for (i, binding) in bindings.iter().enumerate() {
            if binding.iter().any(|b| b == key_str) {
                return Some(i);
            }
        }
        None
    }

    /// Check if a key matches the play/pause binding
    pub fn match_play_pause(&self, key_str: &str) -> bool {
        self.play_pause.iter().any(|b| b == key_str)
    }
}
