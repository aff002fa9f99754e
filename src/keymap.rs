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

use eframe::egui::{Key, Modifiers};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Player actions reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    LoadMedia,
    ToggleFullscreen,
    ExitFullscreen,
    NextAudioTrack,
    TogglePlayback,
    StepForward,
    StepBack,
    VolumeUp,
    VolumeDown,
    ToggleMute,
    Restart
}

impl Action {
    pub fn hint(&self) -> &'static str {
        match self {
            Action::LoadMedia => "Load media (Image/Audio/Video) file: O",
            Action::ToggleFullscreen => "Fullscreen mode: F/Esc",
            Action::ExitFullscreen => "Leave fullscreen: Esc",
            Action::NextAudioTrack => "Select audio track for media: A",
            Action::TogglePlayback => "Play/Pause: Space",
            Action::StepForward => "Jump forward: Right arrow",
            Action::StepBack => "Jump back: Left arrow",
            Action::VolumeUp => "Volume up: Up arrow",
            Action::VolumeDown => "Volume down: Down arrow",
            Action::ToggleMute => "Mute/Unmute sound: M",
            Action::Restart => "Restart the media: Ctrl+R"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shortcut {
    pub key: Key,
    pub ctrl: bool
}

impl Shortcut {
    const fn plain(key: Key) -> Self {
        Self { key, ctrl: false }
    }

    const fn ctrl(key: Key) -> Self {
        Self { key, ctrl: true }
    }
}

pub static DEFAULT_KEYMAP: Lazy<HashMap<Shortcut, Action>> = Lazy::new(|| {
    HashMap::from([
        (Shortcut::plain(Key::O), Action::LoadMedia),
        (Shortcut::plain(Key::F), Action::ToggleFullscreen),
        (Shortcut::plain(Key::Escape), Action::ExitFullscreen),
        (Shortcut::plain(Key::A), Action::NextAudioTrack),
        (Shortcut::plain(Key::Space), Action::TogglePlayback),
        (Shortcut::plain(Key::ArrowRight), Action::StepForward),
        (Shortcut::plain(Key::ArrowLeft), Action::StepBack),
        (Shortcut::plain(Key::ArrowUp), Action::VolumeUp),
        (Shortcut::plain(Key::ArrowDown), Action::VolumeDown),
        (Shortcut::plain(Key::M), Action::ToggleMute),
        (Shortcut::ctrl(Key::R), Action::Restart)
    ])
});

/// Resolves a key press. Ctrl-chords only match their own binding.
pub fn lookup(key: Key, modifiers: Modifiers) -> Option<Action> {
    DEFAULT_KEYMAP.get(&Shortcut { key, ctrl: modifiers.command || modifiers.ctrl }).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_keys_resolve() {
        assert_eq!(lookup(Key::Space, Modifiers::NONE), Some(Action::TogglePlayback));
        assert_eq!(lookup(Key::O, Modifiers::NONE), Some(Action::LoadMedia));
        assert_eq!(lookup(Key::Z, Modifiers::NONE), None);
    }

    #[test]
    fn restart_needs_ctrl() {
        assert_eq!(lookup(Key::R, Modifiers::NONE), None);
        assert_eq!(lookup(Key::R, Modifiers::CTRL), Some(Action::Restart));
        assert_eq!(lookup(Key::M, Modifiers::CTRL), None);
    }

    #[test]
    fn every_action_has_a_binding() {
        let bound: std::collections::HashSet<_> = DEFAULT_KEYMAP.values().copied().collect();
        assert_eq!(bound.len(), DEFAULT_KEYMAP.len());
        assert!(bound.contains(&Action::ExitFullscreen));
    }
}
