// Copyright (C) 2025 Joshua Kesler
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! User settings read from `settings.toml` in the platform config directory.
//!
//! Every field has a default, so a missing file or a partial file is fine.

use crate::error::Result;
use crate::recorder::types::EncoderSettings;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "settings.toml";
const APP_NAME: &str = "MiniMedia";

pub const DEFAULT_THEME: &str = "DARK";
pub const DEFAULT_SEEK_STEP_PERCENT: u8 = 1;
pub const DEFAULT_VOLUME_STEP: u8 = 5;
pub const DEFAULT_VOLUME: u8 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub window_width: f32,
    pub window_height: f32,
    pub theme: String,
    pub themes_dir: Option<PathBuf>,
    pub pictures_dir: Option<PathBuf>,
    pub videos_dir: Option<PathBuf>,
    pub audio_dir: Option<PathBuf>,
    pub seek_step_percent: u8,
    pub volume_step: u8,
    pub initial_volume: u8,
    pub video: EncoderSettings
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_width: 960.0,
            window_height: 720.0,
            theme: DEFAULT_THEME.to_string(),
            themes_dir: None,
            pictures_dir: None,
            videos_dir: None,
            audio_dir: None,
            seek_step_percent: DEFAULT_SEEK_STEP_PERCENT,
            volume_step: DEFAULT_VOLUME_STEP,
            initial_volume: DEFAULT_VOLUME,
            video: EncoderSettings::default()
        }
    }
}

impl Config {
    pub fn themes_dir(&self) -> PathBuf {
        self.themes_dir.clone().unwrap_or_else(|| {
            config_dir().map(|d| d.join("themes")).unwrap_or_else(|| PathBuf::from("themes"))
        })
    }

    pub fn pictures_dir(&self) -> PathBuf {
        self.pictures_dir.clone().or_else(dirs::picture_dir).unwrap_or_else(home_or_cwd)
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.videos_dir.clone().or_else(dirs::video_dir).unwrap_or_else(home_or_cwd)
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.audio_dir.clone().or_else(dirs::audio_dir).unwrap_or_else(home_or_cwd)
    }

    pub fn seek_step(&self) -> u8 {
        self.seek_step_percent.clamp(1, 100)
    }

    pub fn initial_volume(&self) -> u8 {
        self.initial_volume.min(100)
    }
}

fn home_or_cwd() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|path| path.join(APP_NAME))
}

fn get_default_config_path() -> Option<PathBuf> {
    config_dir().map(|path| path.join(CONFIG_FILE))
}

pub fn load() -> Result<Config> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(Config::default())
}

pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    match toml::from_str(&content) {
        Ok(config) => Ok(config),
        Err(e) => {
            warn!("Ignoring invalid settings file {}: {}", path.display(), e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::types::{EncoderPreset, EncodingQuality};
    use tempfile::tempdir;

    fn save_to_path(config: &Config, path: &Path) {
        fs::create_dir_all(path.parent().expect("path has a parent")).expect("failed to create dirs");
        fs::write(path, toml::to_string_pretty(config).expect("config serializes")).expect("failed to write");
    }

    #[test]
    fn save_and_load_preserves_fields() {
        let config = Config {
            theme: "SOLARIZED".to_string(),
            seek_step_percent: 5,
            video: EncoderSettings { encoder: EncoderPreset::Nvidia, quality: EncodingQuality::High, ..Default::default() },
            ..Default::default()
        };
        let temp_dir = tempdir().expect("failed to create temp dir");
        let path = temp_dir.path().join("nested").join("settings.toml");

        save_to_path(&config, &path);
        let loaded = load_from_path(&path).expect("failed to load config");
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let path = temp_dir.path().join("settings.toml");
        fs::write(&path, "theme = \"LIGHT\"\n[video]\nquality = \"low\"\n").expect("failed to write settings");

        let loaded = load_from_path(&path).expect("load should not error");
        assert_eq!(loaded.theme, "LIGHT");
        assert_eq!(loaded.volume_step, DEFAULT_VOLUME_STEP);
        assert_eq!(loaded.video.quality, EncodingQuality::Low);
        assert_eq!(loaded.video.encoder, EncoderPreset::Cpu);
    }

    #[test]
    fn invalid_toml_falls_back_to_defaults() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let path = temp_dir.path().join("settings.toml");
        fs::write(&path, "not = valid = toml").expect("failed to write invalid toml");

        let loaded = load_from_path(&path).expect("load should not error");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn step_and_volume_are_clamped() {
        let config = Config { seek_step_percent: 0, initial_volume: 250, ..Default::default() };
        assert_eq!(config.seek_step(), 1);
        assert_eq!(config.initial_volume(), 100);
    }

    #[test]
    fn explicit_directories_win() {
        let config = Config { pictures_dir: Some(PathBuf::from("/srv/pics")), ..Default::default() };
        assert_eq!(config.pictures_dir(), PathBuf::from("/srv/pics"));
    }
}
