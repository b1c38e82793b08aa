use std::path::{Path, PathBuf};

use anyhow::Context as _;
use helio_roll::geometry::{DEFAULT_BAR_WIDTH, DEFAULT_ROW_HEIGHT};
use helio_roll::{RollViewState, DEFAULT_NOTE_VOLUME};

#[derive(serde::Serialize, serde::Deserialize, Default)]
pub(super) struct AppConfig {
    #[serde(default)]
    pub roll: RollConfig,
    #[serde(default)]
    pub state: StateConfig,
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub(super) struct RollConfig {
    pub row_height: i32,
    pub bar_width: f32,
    pub default_note_volume: f32,
    /// Amplitude of the background noise, 0 for flat rows
    pub noise: u8,
}

impl Default for RollConfig {
    fn default() -> Self {
        Self {
            row_height: DEFAULT_ROW_HEIGHT,
            bar_width: DEFAULT_BAR_WIDTH,
            default_note_volume: DEFAULT_NOTE_VOLUME,
            noise: 2,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub(super) struct StateConfig {
    /// Roll zoom and scroll, relative to the config directory
    pub view_state_file: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            view_state_file: "view_state.json".to_string(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("helio")
}

pub(super) fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

pub(super) fn load_config() -> AppConfig {
    let path = config_path();
    match read_config(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::debug!("Using default config: {:#}", e);
            AppConfig::default()
        }
    }
}

fn read_config(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parsing {}", path.display()))
}

pub(super) fn save_config(config: &AppConfig) {
    let path = config_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(s) = toml::to_string_pretty(config) else { return };
    if let Err(e) = std::fs::write(&path, s) {
        tracing::warn!("Failed to save config to {}: {}", path.display(), e);
    }
}

impl StateConfig {
    fn view_state_path(&self) -> PathBuf {
        config_dir().join(&self.view_state_file)
    }

    pub fn load_view_state(&self) -> anyhow::Result<RollViewState> {
        let path = self.view_state_path();
        let json = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        RollViewState::from_json(&json).with_context(|| format!("decoding {}", path.display()))
    }

    pub fn save_view_state(&self, state: &RollViewState) -> anyhow::Result<()> {
        let path = self.view_state_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, state.to_json()?).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: AppConfig = toml::from_str("[roll]\nbar_width = 120.0\n").unwrap();
        assert_eq!(config.roll.bar_width, 120.0);
        assert_eq!(config.roll.row_height, DEFAULT_ROW_HEIGHT);
        assert_eq!(config.roll.default_note_volume, DEFAULT_NOTE_VOLUME);
        assert_eq!(config.state.view_state_file, "view_state.json");
    }

    #[test]
    fn test_config_round_trip() {
        let mut config = AppConfig::default();
        config.roll.row_height = 16;
        config.state.view_state_file = "roll.json".to_string();
        let s = toml::to_string_pretty(&config).unwrap();
        let back: AppConfig = toml::from_str(&s).unwrap();
        assert_eq!(back.roll.row_height, 16);
        assert_eq!(back.state.view_state_file, "roll.json");
    }
}
