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

//! Runtime theme switching.
//!
//! Themes come from two places: egui's built-in dark and light visuals, and
//! `*.toml` palette files in the themes directory. A palette names a base and
//! overrides a handful of colours:
//!
//! ```toml
//! base = "dark"
//! panel_fill = "#1e1e2e"
//! text = "#cdd6f4"
//! accent = "#89b4fa"
//! ```

use eframe::egui::{self, Color32, Visuals};
use log::{debug, warn};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

const THEME_EXTENSION: &str = "toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Base {
    #[default]
    Dark,
    Light
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct Palette {
    #[serde(default)]
    pub base: Base,
    pub panel_fill: Option<String>,
    pub window_fill: Option<String>,
    pub extreme_bg: Option<String>,
    pub text: Option<String>,
    pub accent: Option<String>
}

/// Parses `#rrggbb` or `#rrggbbaa`.
pub fn parse_hex(color: &str) -> Option<Color32> {
    let hex = color.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some(Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?)),
        8 => Some(Color32::from_rgba_unmultiplied(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => None
    }
}

impl Palette {
    pub fn visuals(&self) -> Visuals {
        let mut visuals = match self.base {
            Base::Dark => Visuals::dark(),
            Base::Light => Visuals::light()
        };
        let color = |field: &Option<String>| {
            field.as_deref().and_then(|c| {
                let parsed = parse_hex(c);
                if parsed.is_none() {
                    warn!("Ignoring invalid theme colour {:?}", c);
                }
                parsed
            })
        };

        if let Some(c) = color(&self.panel_fill) {
            visuals.panel_fill = c;
        }
        if let Some(c) = color(&self.window_fill) {
            visuals.window_fill = c;
        }
        if let Some(c) = color(&self.extreme_bg) {
            visuals.extreme_bg_color = c;
        }
        if let Some(c) = color(&self.text) {
            visuals.override_text_color = Some(c);
        }
        if let Some(c) = color(&self.accent) {
            visuals.selection.bg_fill = c;
            visuals.hyperlink_color = c;
        }
        visuals
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ThemeChoice {
    Builtin(egui::Theme),
    Custom(Palette)
}

impl ThemeChoice {
    pub fn visuals(&self) -> Visuals {
        match self {
            ThemeChoice::Builtin(theme) => theme.default_visuals(),
            ThemeChoice::Custom(palette) => palette.visuals()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    builtin: BTreeMap<String, egui::Theme>,
    custom: BTreeMap<String, Palette>
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        let builtin = BTreeMap::from([
            (String::from("DARK"), egui::Theme::Dark),
            (String::from("LIGHT"), egui::Theme::Light)
        ]);
        Self { builtin, custom: BTreeMap::new() }
    }
}

/// `Ocean.toml` and `ocean.night.toml` both become `OCEAN`.
pub fn theme_name(file_name: &str) -> String {
    file_name.split('.').next().unwrap_or(file_name).to_uppercase()
}

impl ThemeRegistry {
    /// Built-ins plus every readable palette in `dir`. A missing directory is not an error.
    pub fn load_dir(dir: &Path) -> Self {
        let mut registry = Self::default();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("No theme directory at {}: {}", dir.display(), e);
                return registry;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(THEME_EXTENSION) {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else { continue };
            let content = match fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    warn!("Failed to open theme file {}: {}", path.display(), e);
                    continue;
                }
            };
            match toml::from_str::<Palette>(&content) {
                Ok(palette) => {
                    registry.custom.insert(theme_name(file_name), palette);
                },
                Err(e) => warn!("Failed to parse theme file {}: {}", path.display(), e)
            }
        }
        registry
    }

    /// Every selectable name, sorted, without duplicates.
    pub fn names(&self) -> Vec<String> {
        self.builtin.keys().chain(self.custom.keys()).cloned().collect::<BTreeSet<_>>().into_iter().collect()
    }

    /// Built-in styles shadow palette files of the same name.
    pub fn resolve(&self, name: &str) -> Option<ThemeChoice> {
        if let Some(theme) = self.builtin.get(name) {
            return Some(ThemeChoice::Builtin(*theme));
        }
        self.custom.get(name).cloned().map(ThemeChoice::Custom)
    }

    /// Applies `name` to the whole UI. Unknown names are logged and ignored.
    pub fn apply(&self, ctx: &egui::Context, name: &str) -> bool {
        match self.resolve(name) {
            Some(choice) => {
                ctx.set_visuals(choice.visuals());
                debug!("Applied theme: {}", name);
                true
            },
            None => {
                warn!("Theme not found: {}", name);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn builtins_are_always_present() {
        let registry = ThemeRegistry::default();
        assert_eq!(registry.names(), vec!["DARK".to_string(), "LIGHT".to_string()]);
        assert_eq!(registry.resolve("LIGHT"), Some(ThemeChoice::Builtin(egui::Theme::Light)));
        assert_eq!(registry.resolve("light"), None);
    }

    #[test]
    fn loads_palettes_and_sorts_names() {
        let dir = tempdir().expect("failed to create temp dir");
        fs::write(dir.path().join("ocean.toml"), "base = \"light\"\naccent = \"#0077be\"\n").expect("write");
        fs::write(dir.path().join("Amber.night.toml"), "panel_fill = \"#201000\"\n").expect("write");
        fs::write(dir.path().join("notes.txt"), "not a theme").expect("write");
        fs::write(dir.path().join("broken.toml"), "base = 3").expect("write");

        let registry = ThemeRegistry::load_dir(dir.path());
        assert_eq!(registry.names(), vec!["AMBER", "DARK", "LIGHT", "OCEAN"]);

        let Some(ThemeChoice::Custom(ocean)) = registry.resolve("OCEAN") else {
            panic!("OCEAN should be a palette");
        };
        assert_eq!(ocean.base, Base::Light);
        assert_eq!(ocean.visuals().selection.bg_fill, Color32::from_rgb(0x00, 0x77, 0xbe));
    }

    #[test]
    fn palette_named_like_builtin_does_not_shadow_it() {
        let dir = tempdir().expect("failed to create temp dir");
        fs::write(dir.path().join("dark.toml"), "base = \"light\"\n").expect("write");

        let registry = ThemeRegistry::load_dir(dir.path());
        assert_eq!(registry.names(), vec!["DARK", "LIGHT"]);
        assert_eq!(registry.resolve("DARK"), Some(ThemeChoice::Builtin(egui::Theme::Dark)));
    }

    #[test]
    fn missing_directory_yields_builtins() {
        let registry = ThemeRegistry::load_dir(Path::new("/definitely/not/here"));
        assert_eq!(registry.names().len(), 2);
    }

    #[test]
    fn unknown_theme_is_ignored() {
        let ctx = egui::Context::default();
        let registry = ThemeRegistry::default();
        let before = ctx.style().visuals.clone();
        assert!(!registry.apply(&ctx, "WINDOWSVISTA"));
        assert_eq!(ctx.style().visuals, before);
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(parse_hex("#ff0000"), Some(Color32::from_rgb(255, 0, 0)));
        assert_eq!(parse_hex("#00ff0080"), Some(Color32::from_rgba_unmultiplied(0, 255, 0, 128)));
        assert_eq!(parse_hex("ff0000"), None);
        assert_eq!(parse_hex("#ff00"), None);
        assert_eq!(parse_hex("#gg0000"), None);
    }

    #[test]
    fn invalid_colours_keep_base_visuals() {
        let palette = Palette { text: Some("blue".into()), ..Default::default() };
        assert_eq!(palette.visuals().override_text_color, None);
    }
}
