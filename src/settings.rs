// settings.rs
// Loads the viewer settings from viewer.toml (see config::SETTINGS_FILE)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::{DEFAULT_CONTAINER_WIDTH, DEFAULT_DATA_DIR};
use crate::playback::PlaybackSpeed;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// Root of the maps/, history/ and settings documents.
    pub data_dir: PathBuf,
    /// Pixel width the scene is fitted to.
    pub container_width: f32,
    /// Initial playback speed multiplier, one of 0.25, 0.5, 0.75, 1.
    pub speed: PlaybackSpeed,
    /// `error`, `warn`, `info`, `debug`, `trace` or `off`
    pub log_level: String,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            container_width: DEFAULT_CONTAINER_WIDTH,
            speed: PlaybackSpeed::default(),
            log_level: "info".to_string(),
        }
    }
}

impl ViewerSettings {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let settings: ViewerSettings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// A missing file means defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No {} found, using default viewer settings", path.display());
            return Ok(Self::default());
        }
        Self::load_from_file(path)
    }

    /// Parsed log level, `info` when the setting is not a level name.
    pub fn level_filter(&self) -> log::LevelFilter {
        log::LevelFilter::from_str(&self.log_level).unwrap_or(log::LevelFilter::Info)
    }
}
