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

//! Player tab: picks a renderer by file extension and drives transport
//! controls through a [`PlaybackEngine`].

use crate::clock::{format_time, ZERO_TIME};
use crate::error::{MediaError, Result};
use crate::keymap::Action;
use image::RgbaImage;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

pub const UNKNOWN_LANGUAGE: &str = "Unknown Language";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderKind {
    #[default]
    None,
    Image,
    Audio,
    Video
}

impl RenderKind {
    /// Renderer for a file, chosen by extension. `None` for anything unknown.
    pub fn from_path(path: &Path) -> Option<RenderKind> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" | "jpg" | "jpeg" | "bmp" => Some(RenderKind::Image),
            "mp3" | "wav" => Some(RenderKind::Audio),
            "mp4" | "avi" | "mkv" => Some(RenderKind::Video),
            _ => None
        }
    }

    pub fn is_media(self) -> bool {
        matches!(self, RenderKind::Audio | RenderKind::Video)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackInfo {
    pub language: Option<String>
}

impl TrackInfo {
    pub fn label(&self) -> String {
        match self.language.as_deref() {
            Some(lang) if !lang.is_empty() && lang != "und" => lang.to_string(),
            _ => UNKNOWN_LANGUAGE.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaInfo {
    pub duration_ms: u64,
    pub video: Option<VideoStream>,
    pub audio_tracks: Vec<TrackInfo>
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoStream {
    pub width: u32,
    pub height: u32,
    pub fps: f64
}

/// Audio/video decoding and output. Images never reach the engine.
pub trait PlaybackEngine {
    fn open(&mut self, path: &Path) -> Result<MediaInfo>;
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    /// Moves the playhead. Valid in any state.
    fn seek(&mut self, position_ms: u64);
    /// Linear gain, 0.0 to 1.0.
    fn set_volume(&mut self, volume: f32);
    fn set_muted(&mut self, muted: bool);
    fn set_audio_track(&mut self, index: usize);
    /// Processes worker output. Called once per frame.
    fn poll(&mut self);
    /// Playback at the end of the media reports `Paused`.
    fn state(&self) -> PlaybackState;
    fn position_ms(&self) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleIcon {
    Play,
    Pause
}

impl ToggleIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            ToggleIcon::Play => "▶",
            ToggleIcon::Pause => "⏸"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerView {
    pub controls_enabled: bool,
    pub toggle_icon: ToggleIcon,
    pub muted: bool,
    pub elapsed: String,
    pub total: String,
    pub seek_percent: u8,
    pub volume: u8,
    pub audio_tracks: Vec<String>,
    pub selected_track: usize,
    pub track_selector_visible: bool,
    pub video_visible: bool,
    pub fullscreen: bool
}

impl PlayerView {
    fn new(volume: u8) -> Self {
        Self {
            controls_enabled: false,
            toggle_icon: ToggleIcon::Play,
            muted: false,
            elapsed: ZERO_TIME.to_string(),
            total: ZERO_TIME.to_string(),
            seek_percent: 0,
            volume,
            audio_tracks: Vec::new(),
            selected_track: 0,
            track_selector_visible: false,
            video_visible: false,
            fullscreen: false
        }
    }

    pub fn volume_label(&self) -> String {
        format!("{}%", self.volume)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    Load(PathBuf),
    TogglePlayback,
    StepForward,
    StepBack,
    Restart,
    Seek(u8),
    SetVolume(u8),
    VolumeUp,
    VolumeDown,
    ToggleMute,
    NextAudioTrack,
    SelectTrack(usize),
    ToggleFullscreen,
    ExitFullscreen,
    /// The player tab was left.
    TabLeft,
    /// Per-frame refresh from the engine.
    Tick
}

#[derive(Debug, Clone, Copy)]
pub struct PlayerSettings {
    pub seek_step: u8,
    pub volume_step: u8,
    pub initial_volume: u8
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self { seek_step: 1, volume_step: 5, initial_volume: 100 }
    }
}

#[derive(Debug)]
pub struct PlaybackController {
    settings: PlayerSettings,
    kind: RenderKind,
    state: PlaybackState,
    source: Option<PathBuf>,
    image: Option<RgbaImage>,
    image_revision: u64,
    info: MediaInfo,
    view: PlayerView
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new(PlayerSettings::default())
    }
}

impl PlaybackController {
    pub fn new(settings: PlayerSettings) -> Self {
        Self {
            settings,
            kind: RenderKind::None,
            state: PlaybackState::Stopped,
            source: None,
            image: None,
            image_revision: 0,
            info: MediaInfo::default(),
            view: PlayerView::new(settings.initial_volume.min(100))
        }
    }

    pub fn kind(&self) -> RenderKind {
        self.kind
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn view(&self) -> &PlayerView {
        &self.view
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    /// Bumped every time a new image is loaded.
    pub fn image_revision(&self) -> u64 {
        self.image_revision
    }

    /// Maps a shortcut to an event. `LoadMedia` is left to the caller since it
    /// needs a file dialog; everything else only works on video.
    pub fn shortcut_event(&self, action: Action) -> Option<PlayerEvent> {
        if self.kind != RenderKind::Video {
            return None;
        }
        Some(match action {
            Action::LoadMedia => return None,
            Action::ToggleFullscreen => PlayerEvent::ToggleFullscreen,
            Action::ExitFullscreen => PlayerEvent::ExitFullscreen,
            Action::NextAudioTrack => PlayerEvent::NextAudioTrack,
            Action::TogglePlayback => PlayerEvent::TogglePlayback,
            Action::StepForward => PlayerEvent::StepForward,
            Action::StepBack => PlayerEvent::StepBack,
            Action::VolumeUp => PlayerEvent::VolumeUp,
            Action::VolumeDown => PlayerEvent::VolumeDown,
            Action::ToggleMute => PlayerEvent::ToggleMute,
            Action::Restart => PlayerEvent::Restart
        })
    }

    pub fn handle(&mut self, event: PlayerEvent, engine: &mut dyn PlaybackEngine) {
        match event {
            PlayerEvent::Load(path) => {
                if let Err(e) = self.load(&path, engine) {
                    warn!("Failed to load media: {}", e);
                }
            },
            PlayerEvent::TogglePlayback => self.toggle(engine),
            PlayerEvent::StepForward => self.step(i16::from(self.settings.seek_step), engine),
            PlayerEvent::StepBack => self.step(-i16::from(self.settings.seek_step), engine),
            PlayerEvent::Restart => self.restart(engine),
            PlayerEvent::Seek(percent) => self.seek(percent, engine),
            PlayerEvent::SetVolume(volume) => self.set_volume(volume, engine),
            PlayerEvent::VolumeUp => self.set_volume(self.view.volume.saturating_add(self.settings.volume_step), engine),
            PlayerEvent::VolumeDown => self.set_volume(self.view.volume.saturating_sub(self.settings.volume_step), engine),
            PlayerEvent::ToggleMute => {
                self.view.muted = !self.view.muted;
                engine.set_muted(self.view.muted);
                debug!("Muted: {}", self.view.muted);
            },
            PlayerEvent::NextAudioTrack => self.next_audio_track(engine),
            PlayerEvent::SelectTrack(index) => self.select_track(index, engine),
            PlayerEvent::ToggleFullscreen => {
                if self.kind == RenderKind::Video {
                    self.view.fullscreen = !self.view.fullscreen;
                }
            },
            PlayerEvent::ExitFullscreen => self.view.fullscreen = false,
            PlayerEvent::TabLeft => {
                if self.state == PlaybackState::Playing {
                    self.pause(engine);
                }
            },
            PlayerEvent::Tick => self.refresh(engine)
        }
    }

    fn load(&mut self, path: &Path, engine: &mut dyn PlaybackEngine) -> Result<()> {
        let kind = RenderKind::from_path(path).ok_or_else(|| MediaError::UnsupportedFile(path.to_path_buf()))?;
        match kind {
            RenderKind::Image => {
                let image = image::open(path).map_err(|source| MediaError::ImageLoad { path: path.to_path_buf(), source })?;
                engine.stop();
                self.image = Some(image.to_rgba8());
                self.image_revision += 1;
                self.info = MediaInfo::default();
                self.state = PlaybackState::Stopped;
                self.view = PlayerView { volume: self.view.volume, muted: self.view.muted, ..PlayerView::new(0) };
            },
            RenderKind::Audio | RenderKind::Video => {
                let info = engine.open(path)?;
                engine.set_volume(f32::from(self.view.volume) / 100.0);
                engine.set_muted(self.view.muted);
                engine.play();
                self.image = None;
                self.state = PlaybackState::Playing;
                self.view = PlayerView {
                    volume: self.view.volume,
                    muted: self.view.muted,
                    controls_enabled: true,
                    toggle_icon: ToggleIcon::Pause,
                    total: format_time(info.duration_ms),
                    audio_tracks: info.audio_tracks.iter().map(TrackInfo::label).collect(),
                    track_selector_visible: info.audio_tracks.len() > 1,
                    video_visible: kind == RenderKind::Video,
                    ..PlayerView::new(0)
                };
                self.info = info;
            },
            RenderKind::None => {}
        }
        self.kind = kind;
        self.source = Some(path.to_path_buf());
        info!("Loaded {:?}: {}", kind, path.display());
        Ok(())
    }

    fn toggle(&mut self, engine: &mut dyn PlaybackEngine) {
        if !self.kind.is_media() {
            debug!("Nothing to play");
            return;
        }
        match self.state {
            PlaybackState::Playing => self.pause(engine),
            PlaybackState::Paused | PlaybackState::Stopped => {
                engine.play();
                self.set_state(PlaybackState::Playing);
            }
        }
    }

    fn pause(&mut self, engine: &mut dyn PlaybackEngine) {
        engine.pause();
        self.set_state(PlaybackState::Paused);
    }

    fn set_state(&mut self, state: PlaybackState) {
        self.state = state;
        self.view.toggle_icon = match state {
            PlaybackState::Playing => ToggleIcon::Pause,
            PlaybackState::Paused | PlaybackState::Stopped => ToggleIcon::Play
        };
    }

    fn transport_active(&self) -> bool {
        self.kind.is_media() && matches!(self.state, PlaybackState::Playing | PlaybackState::Paused)
    }

    fn step(&mut self, delta: i16, engine: &mut dyn PlaybackEngine) {
        if !self.transport_active() {
            debug!("Step ignored while {:?}", self.state);
            return;
        }
        let target = (i16::from(self.view.seek_percent) + delta).clamp(0, 100) as u8;
        self.seek(target, engine);
    }

    fn restart(&mut self, engine: &mut dyn PlaybackEngine) {
        if !self.transport_active() {
            debug!("Restart ignored while {:?}", self.state);
            return;
        }
        engine.seek(0);
        self.view.seek_percent = 0;
        self.view.elapsed = ZERO_TIME.to_string();
    }

    fn seek(&mut self, percent: u8, engine: &mut dyn PlaybackEngine) {
        if !self.kind.is_media() || self.info.duration_ms == 0 {
            debug!("Seek ignored without a duration");
            return;
        }
        let percent = percent.min(100);
        let position = self.info.duration_ms * u64::from(percent) / 100;
        engine.seek(position);
        self.view.seek_percent = percent;
        self.view.elapsed = format_time(position);
    }

    fn set_volume(&mut self, volume: u8, engine: &mut dyn PlaybackEngine) {
        let volume = volume.min(100);
        self.view.volume = volume;
        engine.set_volume(f32::from(volume) / 100.0);
    }

    fn next_audio_track(&mut self, engine: &mut dyn PlaybackEngine) {
        let count = self.view.audio_tracks.len();
        if self.kind != RenderKind::Video || count <= 1 {
            debug!("No other audio track to switch to");
            return;
        }
        let next = (self.view.selected_track + 1) % count;
        self.select_track(next, engine);
    }

    fn select_track(&mut self, index: usize, engine: &mut dyn PlaybackEngine) {
        if index >= self.view.audio_tracks.len() || index == self.view.selected_track {
            return;
        }
        engine.set_audio_track(index);
        self.view.selected_track = index;
        info!("Audio track set to: {}", self.view.audio_tracks[index]);
    }

    fn refresh(&mut self, engine: &mut dyn PlaybackEngine) {
        if !self.kind.is_media() {
            return;
        }
        engine.poll();
        let state = engine.state();
        if state != self.state {
            self.set_state(state);
        }
        let position = engine.position_ms().min(self.info.duration_ms);
        self.view.elapsed = format_time(position);
        if self.info.duration_ms > 0 {
            self.view.seek_percent = (position * 100 / self.info.duration_ms) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[derive(Debug, Default)]
    struct FakeEngine {
        info: MediaInfo,
        fail_open: bool,
        state: PlaybackState,
        position: u64,
        volume: f32,
        muted: bool,
        track: usize,
        seeks: Vec<u64>,
        stops: usize
    }

    impl PlaybackEngine for FakeEngine {
        fn open(&mut self, path: &Path) -> Result<MediaInfo> {
            if self.fail_open {
                return Err(MediaError::Probe { path: path.to_path_buf(), reason: "unreadable".into() });
            }
            self.state = PlaybackState::Stopped;
            Ok(self.info.clone())
        }
        fn play(&mut self) {
            self.state = PlaybackState::Playing;
        }
        fn pause(&mut self) {
            self.state = PlaybackState::Paused;
        }
        fn stop(&mut self) {
            self.stops += 1;
            self.state = PlaybackState::Stopped;
        }
        fn seek(&mut self, position_ms: u64) {
            self.position = position_ms;
            self.seeks.push(position_ms);
        }
        fn set_volume(&mut self, volume: f32) {
            self.volume = volume;
        }
        fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
        }
        fn set_audio_track(&mut self, index: usize) {
            self.track = index;
        }
        fn poll(&mut self) {}
        fn state(&self) -> PlaybackState {
            self.state
        }
        fn position_ms(&self) -> u64 {
            self.position
        }
    }

    fn two_track_video() -> FakeEngine {
        FakeEngine {
            info: MediaInfo {
                duration_ms: 200_000,
                video: Some(VideoStream { width: 64, height: 48, fps: 25.0 }),
                audio_tracks: vec![TrackInfo { language: Some("eng".into()) }, TrackInfo { language: None }]
            },
            ..Default::default()
        }
    }

    fn playing_video() -> (PlaybackController, FakeEngine) {
        let mut controller = PlaybackController::default();
        let mut engine = two_track_video();
        controller.handle(PlayerEvent::Load(PathBuf::from("movie.MKV")), &mut engine);
        (controller, engine)
    }

    fn write_png(dir: &Path) -> PathBuf {
        let path = dir.join("still.png");
        RgbaImage::from_pixel(6, 4, image::Rgba([1, 2, 3, 255])).save(&path).expect("write png");
        path
    }

    #[test]
    fn extension_selects_renderer() {
        assert_eq!(RenderKind::from_path(Path::new("a.png")), Some(RenderKind::Image));
        assert_eq!(RenderKind::from_path(Path::new("a.JPEG")), Some(RenderKind::Image));
        assert_eq!(RenderKind::from_path(Path::new("a.Mp3")), Some(RenderKind::Audio));
        assert_eq!(RenderKind::from_path(Path::new("a.mp4")), Some(RenderKind::Video));
        assert_eq!(RenderKind::from_path(Path::new("a.gif")), None);
        assert_eq!(RenderKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn loading_video_enables_transport() {
        let (controller, engine) = playing_video();
        let view = controller.view();
        assert_eq!(controller.kind(), RenderKind::Video);
        assert!(view.controls_enabled && view.video_visible);
        assert_eq!(view.toggle_icon, ToggleIcon::Pause);
        assert_eq!(view.total, "00:03:20");
        assert_eq!(view.audio_tracks, vec!["eng".to_string(), UNKNOWN_LANGUAGE.to_string()]);
        assert!(view.track_selector_visible);
        assert_eq!(engine.state, PlaybackState::Playing);
        assert_eq!(engine.volume, 1.0);
    }

    #[test]
    fn unknown_extension_leaves_state_untouched() {
        let (mut controller, mut engine) = playing_video();
        let before = controller.view().clone();
        controller.handle(PlayerEvent::Load(PathBuf::from("notes.txt")), &mut engine);
        assert_eq!(controller.kind(), RenderKind::Video);
        assert_eq!(controller.view(), &before);
        assert_eq!(engine.state, PlaybackState::Playing);
    }

    #[test]
    fn failed_open_leaves_state_untouched() {
        let (mut controller, mut engine) = playing_video();
        engine.fail_open = true;
        controller.handle(PlayerEvent::Load(PathBuf::from("broken.wav")), &mut engine);
        assert_eq!(controller.kind(), RenderKind::Video);
        assert_eq!(controller.source(), Some(Path::new("movie.MKV")));
    }

    #[test]
    fn loading_image_stops_media_and_disables_transport() {
        let dir = tempdir().expect("failed to create temp dir");
        let png = write_png(dir.path());
        let (mut controller, mut engine) = playing_video();

        controller.handle(PlayerEvent::Load(png), &mut engine);
        assert_eq!(controller.kind(), RenderKind::Image);
        assert_eq!(engine.stops, 1);
        assert_eq!(controller.image().map(|i| i.dimensions()), Some((6, 4)));
        assert_eq!(controller.image_revision(), 1);
        let view = controller.view();
        assert!(!view.controls_enabled && !view.track_selector_visible && !view.video_visible);
        assert_eq!(view.toggle_icon, ToggleIcon::Play);
    }

    #[test]
    fn corrupt_image_is_rejected() {
        let dir = tempdir().expect("failed to create temp dir");
        let path = dir.path().join("fake.png");
        std::fs::write(&path, b"not a png").expect("write");
        let mut controller = PlaybackController::default();
        let mut engine = FakeEngine::default();
        controller.handle(PlayerEvent::Load(path), &mut engine);
        assert_eq!(controller.kind(), RenderKind::None);
        assert!(controller.image().is_none());
    }

    #[test]
    fn toggle_swaps_icon() {
        let (mut controller, mut engine) = playing_video();
        controller.handle(PlayerEvent::TogglePlayback, &mut engine);
        assert_eq!(controller.state(), PlaybackState::Paused);
        assert_eq!(controller.view().toggle_icon, ToggleIcon::Play);
        assert!(controller.view().controls_enabled);
        controller.handle(PlayerEvent::TogglePlayback, &mut engine);
        assert_eq!(engine.state, PlaybackState::Playing);
    }

    #[test]
    fn seek_maps_percent_to_position() {
        let (mut controller, mut engine) = playing_video();
        controller.handle(PlayerEvent::Seek(25), &mut engine);
        assert_eq!(engine.position, 50_000);
        assert_eq!(controller.view().elapsed, "00:00:50");
    }

    #[test]
    fn seek_without_duration_is_ignored() {
        let mut controller = PlaybackController::default();
        let mut engine = FakeEngine::default();
        controller.handle(PlayerEvent::Load(PathBuf::from("live.mp4")), &mut engine);
        controller.handle(PlayerEvent::Seek(50), &mut engine);
        assert!(engine.seeks.is_empty());
    }

    #[test]
    fn steps_and_restart_move_the_slider() {
        let (mut controller, mut engine) = playing_video();
        controller.handle(PlayerEvent::StepForward, &mut engine);
        controller.handle(PlayerEvent::StepForward, &mut engine);
        assert_eq!(controller.view().seek_percent, 2);
        controller.handle(PlayerEvent::StepBack, &mut engine);
        assert_eq!(engine.position, 2_000);
        controller.handle(PlayerEvent::Restart, &mut engine);
        assert_eq!(engine.position, 0);
        assert_eq!(controller.view().seek_percent, 0);
    }

    #[test]
    fn step_back_clamps_at_zero() {
        let (mut controller, mut engine) = playing_video();
        controller.handle(PlayerEvent::StepBack, &mut engine);
        assert_eq!(controller.view().seek_percent, 0);
    }

    #[test]
    fn volume_keys_clamp_to_range() {
        let (mut controller, mut engine) = playing_video();
        controller.handle(PlayerEvent::VolumeUp, &mut engine);
        assert_eq!(controller.view().volume, 100);
        for _ in 0..3 {
            controller.handle(PlayerEvent::VolumeDown, &mut engine);
        }
        assert_eq!(controller.view().volume_label(), "85%");
        assert!((engine.volume - 0.85).abs() < f32::EPSILON);
        controller.handle(PlayerEvent::SetVolume(3), &mut engine);
        controller.handle(PlayerEvent::VolumeDown, &mut engine);
        assert_eq!(controller.view().volume, 0);
    }

    #[test]
    fn mute_toggles_engine() {
        let (mut controller, mut engine) = playing_video();
        controller.handle(PlayerEvent::ToggleMute, &mut engine);
        assert!(engine.muted && controller.view().muted);
        controller.handle(PlayerEvent::ToggleMute, &mut engine);
        assert!(!engine.muted);
    }

    #[test]
    fn next_track_wraps() {
        let (mut controller, mut engine) = playing_video();
        controller.handle(PlayerEvent::NextAudioTrack, &mut engine);
        assert_eq!(engine.track, 1);
        controller.handle(PlayerEvent::NextAudioTrack, &mut engine);
        assert_eq!(engine.track, 0);
        assert_eq!(controller.view().selected_track, 0);
    }

    #[test]
    fn single_track_hides_selector() {
        let mut controller = PlaybackController::default();
        let mut engine = FakeEngine {
            info: MediaInfo { duration_ms: 1000, video: None, audio_tracks: vec![TrackInfo::default()] },
            ..Default::default()
        };
        controller.handle(PlayerEvent::Load(PathBuf::from("song.mp3")), &mut engine);
        assert!(!controller.view().track_selector_visible);
        assert!(!controller.view().video_visible);
        controller.handle(PlayerEvent::NextAudioTrack, &mut engine);
        assert_eq!(engine.track, 0);
    }

    #[test]
    fn shortcuts_only_drive_video() {
        let (controller, _) = playing_video();
        assert_eq!(controller.shortcut_event(Action::TogglePlayback), Some(PlayerEvent::TogglePlayback));
        assert_eq!(controller.shortcut_event(Action::LoadMedia), None);

        let idle = PlaybackController::default();
        assert_eq!(idle.shortcut_event(Action::TogglePlayback), None);
        assert_eq!(idle.shortcut_event(Action::ToggleFullscreen), None);
    }

    #[test]
    fn fullscreen_only_for_video() {
        let (mut controller, mut engine) = playing_video();
        controller.handle(PlayerEvent::ToggleFullscreen, &mut engine);
        assert!(controller.view().fullscreen);
        controller.handle(PlayerEvent::ExitFullscreen, &mut engine);
        assert!(!controller.view().fullscreen);

        let mut idle = PlaybackController::default();
        idle.handle(PlayerEvent::ToggleFullscreen, &mut engine);
        assert!(!idle.view().fullscreen);
    }

    #[test]
    fn leaving_tab_pauses_playback() {
        let (mut controller, mut engine) = playing_video();
        controller.handle(PlayerEvent::TabLeft, &mut engine);
        assert_eq!(engine.state, PlaybackState::Paused);
        assert_eq!(controller.view().toggle_icon, ToggleIcon::Play);
    }

    #[test]
    fn tick_follows_engine_to_the_end() {
        let (mut controller, mut engine) = playing_video();
        engine.position = 100_000;
        controller.handle(PlayerEvent::Tick, &mut engine);
        assert_eq!(controller.view().seek_percent, 50);
        assert_eq!(controller.view().elapsed, "00:01:40");

        engine.position = 250_000;
        engine.state = PlaybackState::Paused;
        controller.handle(PlayerEvent::Tick, &mut engine);
        assert_eq!(controller.view().seek_percent, 100);
        assert_eq!(controller.view().toggle_icon, ToggleIcon::Play);
        assert_eq!(controller.state(), PlaybackState::Paused);
    }
}
