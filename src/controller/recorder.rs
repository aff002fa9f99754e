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

//! Recorder tab: capture mode cycling, recording state, photo preview.
//!
//! The controller owns no devices. Everything that touches hardware goes
//! through [`CaptureBackend`], and everything the UI shows is in
//! [`RecorderView`].

use super::Notice;
use crate::clock::{format_time, Stopwatch, ZERO_TIME};
use crate::error::Result;
use image::RgbImage;
use log::{debug, info, warn};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMode {
    #[default]
    None,
    Camera,
    Video,
    Audio
}

impl CaptureMode {
    /// Mode selected by the "next" button.
    pub fn next(self) -> CaptureMode {
        match self {
            CaptureMode::None => CaptureMode::Camera,
            CaptureMode::Camera => CaptureMode::Video,
            CaptureMode::Video => CaptureMode::Audio,
            CaptureMode::Audio => CaptureMode::Camera
        }
    }

    pub fn recording(self) -> Option<Recording> {
        match self {
            CaptureMode::Video => Some(Recording::Video),
            CaptureMode::Audio => Some(Recording::Audio),
            CaptureMode::None | CaptureMode::Camera => None
        }
    }

    fn idle_icon(self) -> CaptureIcon {
        match self {
            CaptureMode::None | CaptureMode::Camera => CaptureIcon::CaptureImage,
            CaptureMode::Video => CaptureIcon::RecordVideo,
            CaptureMode::Audio => CaptureIcon::Microphone
        }
    }
}

/// Which recorder a recording runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recording {
    Video,
    Audio
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingState {
    #[default]
    Stopped,
    Paused,
    Active
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordEvent {
    Start,
    Pause,
    Resume,
    Stop
}

impl RecordingState {
    /// Transition table. `None` means the event is not valid in this state.
    pub fn apply(self, event: RecordEvent) -> Option<RecordingState> {
        use RecordEvent::*;
        use RecordingState::*;
        match (self, event) {
            (Stopped, Start) => Some(Active),
            (Active, Pause) => Some(Paused),
            (Paused, Resume) => Some(Active),
            (Active | Paused, Stop) => Some(Stopped),
            _ => None
        }
    }

    /// What the capture button does in video or audio mode.
    pub fn press_event(self) -> RecordEvent {
        match self {
            RecordingState::Stopped => RecordEvent::Start,
            RecordingState::Active => RecordEvent::Pause,
            RecordingState::Paused => RecordEvent::Resume
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureIcon {
    CaptureImage,
    RecordVideo,
    Microphone,
    Pause,
    Resume
}

impl CaptureIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            CaptureIcon::CaptureImage => "📷",
            CaptureIcon::RecordVideo => "🎥",
            CaptureIcon::Microphone => "🎤",
            CaptureIcon::Pause => "⏸",
            CaptureIcon::Resume => "▶"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderView {
    pub capture_icon: CaptureIcon,
    pub capture_enabled: bool,
    pub next_enabled: bool,
    pub save_enabled: bool,
    pub cancel_enabled: bool,
    pub cancel_visible: bool,
    pub timer_visible: bool,
    pub camera_visible: bool,
    pub preview_visible: bool
}

impl Default for RecorderView {
    fn default() -> Self {
        Self {
            capture_icon: CaptureIcon::CaptureImage,
            capture_enabled: true,
            next_enabled: true,
            save_enabled: false,
            cancel_enabled: false,
            cancel_visible: true,
            timer_visible: false,
            camera_visible: false,
            preview_visible: false
        }
    }
}

/// Device side of the recorder tab.
pub trait CaptureBackend {
    fn has_camera(&self) -> bool;
    fn has_microphone(&self) -> bool;
    fn open_camera(&mut self);
    fn close_camera(&mut self);
    /// Requests a photo; it arrives later as [`RecorderEvent::PhotoCaptured`].
    fn capture_photo(&mut self) -> Result<()>;
    /// Starts a recording and returns the file it will be written to.
    fn start_recording(&mut self, kind: Recording) -> Result<PathBuf>;
    fn pause_recording(&mut self, kind: Recording);
    fn resume_recording(&mut self, kind: Recording);
    fn stop_recording(&mut self, kind: Recording);
    /// Asks the user where to save a photo. `None` means cancelled.
    fn choose_photo_path(&mut self) -> Option<PathBuf>;
}

#[derive(Debug, Clone)]
pub enum RecorderEvent {
    NextMode,
    Capture,
    Save,
    Cancel,
    /// The recorder tab was left.
    TabLeft,
    /// The recorder tab became current again.
    TabEntered,
    PhotoCaptured(RgbImage),
    RecordingFailed(String)
}

#[derive(Debug, Default)]
pub struct CaptureController {
    mode: CaptureMode,
    state: RecordingState,
    view: RecorderView,
    photo: Option<RgbImage>,
    clock: Stopwatch,
    notice: Option<Notice>
}

impl CaptureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn recording_state(&self) -> RecordingState {
        self.state
    }

    pub fn view(&self) -> &RecorderView {
        &self.view
    }

    pub fn photo(&self) -> Option<&RgbImage> {
        self.photo.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn timer_text(&self) -> String {
        format_time(self.clock.elapsed_ms())
    }

    pub fn handle(&mut self, event: RecorderEvent, backend: &mut dyn CaptureBackend) {
        match event {
            RecorderEvent::NextMode => self.next_mode(backend),
            RecorderEvent::Capture => self.capture(backend),
            RecorderEvent::Save => self.save(backend),
            RecorderEvent::Cancel => self.hide_preview(),
            RecorderEvent::TabLeft => self.leave_tab(backend),
            RecorderEvent::TabEntered => self.enter_tab(backend),
            RecorderEvent::PhotoCaptured(photo) => self.show_preview(photo),
            RecorderEvent::RecordingFailed(reason) => self.recording_failed(reason, backend)
        }
    }

    fn next_mode(&mut self, backend: &mut dyn CaptureBackend) {
        if let Some(kind) = self.mode.recording() {
            self.stop_recording(kind, backend);
        }
        match self.mode.next() {
            CaptureMode::Camera => self.enter_camera_mode(backend),
            CaptureMode::Video => self.enter_video_mode(backend),
            CaptureMode::Audio => self.enter_audio_mode(backend),
            CaptureMode::None => {}
        }
        self.view.save_enabled = false;
        self.view.cancel_enabled = false;
    }

    fn capture(&mut self, backend: &mut dyn CaptureBackend) {
        match self.mode {
            CaptureMode::None => debug!("Capture pressed with no capture mode"),
            CaptureMode::Camera => self.capture_photo(backend),
            CaptureMode::Video | CaptureMode::Audio => {
                let Some(kind) = self.mode.recording() else { return };
                match self.state.press_event() {
                    RecordEvent::Start => self.start_recording(kind, backend),
                    RecordEvent::Pause => self.pause_recording(kind, backend),
                    RecordEvent::Resume => self.resume_recording(kind, backend),
                    RecordEvent::Stop => self.stop_recording(kind, backend)
                }
            }
        }
    }

    fn save(&mut self, backend: &mut dyn CaptureBackend) {
        match self.mode {
            CaptureMode::None => {}
            CaptureMode::Camera => self.save_photo(backend),
            CaptureMode::Video => self.stop_recording(Recording::Video, backend),
            CaptureMode::Audio => self.stop_recording(Recording::Audio, backend)
        }
    }

    fn leave_tab(&mut self, backend: &mut dyn CaptureBackend) {
        match self.mode {
            CaptureMode::None => debug!("No recording or capture event is active"),
            CaptureMode::Camera => self.close_camera(backend),
            CaptureMode::Video => {
                self.stop_recording(Recording::Video, backend);
                self.close_camera(backend);
            },
            CaptureMode::Audio => self.stop_recording(Recording::Audio, backend)
        }
    }

    fn enter_tab(&mut self, backend: &mut dyn CaptureBackend) {
        match self.mode {
            CaptureMode::None => debug!("No recording or capture event is active"),
            CaptureMode::Camera => self.enter_camera_mode(backend),
            CaptureMode::Video => self.enter_video_mode(backend),
            CaptureMode::Audio => self.enter_audio_mode(backend)
        }
    }

    // Modes

    fn enter_camera_mode(&mut self, backend: &mut dyn CaptureBackend) {
        self.mode = CaptureMode::Camera;
        self.view.capture_icon = CaptureIcon::CaptureImage;
        self.show_camera(backend);
        self.view.cancel_enabled = false;
        self.view.cancel_visible = true;
        self.view.timer_visible = false;
        self.clock.reset();
        debug!("Set to image capture mode");
    }

    fn enter_video_mode(&mut self, backend: &mut dyn CaptureBackend) {
        self.mode = CaptureMode::Video;
        self.view.capture_icon = CaptureIcon::RecordVideo;
        self.show_camera(backend);
        self.view.cancel_enabled = false;
        self.view.cancel_visible = false;
        self.view.timer_visible = true;
        debug!("Set to video capture mode");
    }

    fn enter_audio_mode(&mut self, backend: &mut dyn CaptureBackend) {
        self.close_camera(backend);
        self.mode = CaptureMode::Audio;
        self.view.capture_icon = CaptureIcon::Microphone;
        self.view.cancel_enabled = false;
        self.view.cancel_visible = false;
        self.view.timer_visible = true;
        debug!("Set to audio capture mode");
    }

    // Camera

    fn show_camera(&mut self, backend: &mut dyn CaptureBackend) {
        if !backend.has_camera() {
            debug!("No camera device found");
            return;
        }
        backend.open_camera();
        self.view.camera_visible = true;
    }

    fn close_camera(&mut self, backend: &mut dyn CaptureBackend) {
        self.view.camera_visible = false;
        backend.close_camera();
        debug!("Camera closed");
    }

    fn capture_photo(&mut self, backend: &mut dyn CaptureBackend) {
        if !backend.has_camera() {
            debug!("Camera not started");
            return;
        }
        match backend.capture_photo() {
            Ok(()) => debug!("Requested an image capture"),
            Err(e) => warn!("Image capture failed: {}", e)
        }
    }

    fn show_preview(&mut self, photo: RgbImage) {
        if self.mode != CaptureMode::Camera {
            debug!("Dropping photo captured outside camera mode");
            return;
        }
        if photo.width() == 0 || photo.height() == 0 {
            debug!("Failed to display image preview");
            return;
        }
        info!("Image captured: {}x{}", photo.width(), photo.height());
        self.photo = Some(photo);
        self.view.camera_visible = false;
        self.view.preview_visible = true;
        self.view.capture_enabled = false;
        self.view.cancel_enabled = true;
        self.view.next_enabled = false;
        self.view.save_enabled = true;
    }

    fn hide_preview(&mut self) {
        if !self.view.preview_visible {
            return;
        }
        self.photo = None;
        self.view.preview_visible = false;
        self.view.camera_visible = true;
        self.view.capture_enabled = true;
        self.view.cancel_enabled = false;
        self.view.next_enabled = true;
        self.view.save_enabled = false;
        debug!("Image preview hidden");
    }

    fn save_photo(&mut self, backend: &mut dyn CaptureBackend) {
        let Some(photo) = &self.photo else {
            debug!("No image to save");
            self.notice = Some(Notice::warning("Save Failed", "No image has been captured to save."));
            return;
        };
        let Some(path) = backend.choose_photo_path() else {
            debug!("Save operation cancelled");
            return;
        };

        match photo.save(&path) {
            Ok(()) => {
                info!("Image successfully saved at: {}", path.display());
                self.notice = Some(Notice::info("Image Saved", "Image has been saved successfully!"));
            },
            Err(e) => {
                warn!("Failed to save image at {}: {}", path.display(), e);
                self.notice = Some(Notice::warning("Save Failed", "Failed to save the image."));
            }
        }
        self.hide_preview();
        self.show_camera(backend);
    }

    // Recording

    fn transition(&mut self, event: RecordEvent) -> bool {
        match self.state.apply(event) {
            Some(next) => {
                self.state = next;
                true
            },
            None => {
                debug!("Ignoring {:?} while {:?}", event, self.state);
                false
            }
        }
    }

    fn start_recording(&mut self, kind: Recording, backend: &mut dyn CaptureBackend) {
        if self.state.apply(RecordEvent::Start).is_none() {
            warn!("Already recording");
            return;
        }
        match backend.start_recording(kind) {
            Ok(path) => {
                info!("{:?} recording started: {}", kind, path.display());
                self.transition(RecordEvent::Start);
                self.clock.reset();
                self.clock.start();
                self.set_active_affordances();
            },
            Err(e) => warn!("Failed to start {:?} recording: {}", kind, e)
        }
    }

    fn pause_recording(&mut self, kind: Recording, backend: &mut dyn CaptureBackend) {
        if !self.transition(RecordEvent::Pause) {
            return;
        }
        backend.pause_recording(kind);
        self.clock.pause();
        self.view.capture_icon = CaptureIcon::Resume;
        debug!("Recording paused");
    }

    fn resume_recording(&mut self, kind: Recording, backend: &mut dyn CaptureBackend) {
        if !self.transition(RecordEvent::Resume) {
            return;
        }
        backend.resume_recording(kind);
        self.clock.start();
        self.set_active_affordances();
        debug!("Recording resumed");
    }

    fn stop_recording(&mut self, kind: Recording, backend: &mut dyn CaptureBackend) {
        if self.state.apply(RecordEvent::Stop).is_none() {
            debug!("Can't save, not in a recording/paused state");
            return;
        }
        backend.stop_recording(kind);
        self.set_stopped();
    }

    fn recording_failed(&mut self, reason: String, backend: &mut dyn CaptureBackend) {
        warn!("Recording failed: {}", reason);
        // The camera may still be forwarding frames.
        if let Some(kind) = self.mode.recording() {
            if self.state != RecordingState::Stopped {
                backend.stop_recording(kind);
            }
        }
        self.set_stopped();
        self.notice = Some(Notice::warning("Recording Failed", reason));
    }

    fn set_active_affordances(&mut self) {
        self.view.capture_icon = CaptureIcon::Pause;
        self.view.save_enabled = true;
    }

    fn set_stopped(&mut self) {
        if self.state == RecordingState::Stopped {
            return;
        }
        self.state = RecordingState::Stopped;
        self.view.save_enabled = false;
        self.view.capture_icon = self.mode.idle_icon();
        self.clock.reset();
        debug!("Recording stopped, timer reset to {}", ZERO_TIME);
    }
}
