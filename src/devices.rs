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

use crate::config::Config;
use crate::controller::recorder::{CaptureBackend, Recording};
use crate::error::{MediaError, Result};
use crate::messages::{audio::{AudioCommand, AudioDevice}, camera::{CameraCommand, CameraDevice}, recorder::RecorderCommand};
use crate::recorder::types::EncoderSettings;
use chrono::{DateTime, Local};
use crossbeam_channel::Sender;
use log::debug;
use std::{fs, path::{Path, PathBuf}};

pub const PHOTO_FILE_NAME: &str = "captured_image.jpg";
pub const PHOTO_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// `video_20250102_030405.mp4`
pub fn timestamped_name(prefix: &str, extension: &str, at: DateTime<Local>) -> String {
    format!("{}_{}.{}", prefix, at.format("%Y%m%d_%H%M%S"), extension)
}

fn recording_path(dir: &Path, prefix: &str, extension: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    Ok(dir.join(timestamped_name(prefix, extension, Local::now())))
}

/// Camera, recorder and microphone workers behind the capture controller.
pub struct DeviceBackend {
    cameras: Vec<CameraDevice>,
    microphones: Vec<AudioDevice>,
    camera_tx: Sender<CameraCommand>,
    rec_tx: Sender<RecorderCommand>,
    audio_tx: Sender<AudioCommand>,
    settings: EncoderSettings,
    pictures_dir: PathBuf,
    videos_dir: PathBuf,
    audio_dir: PathBuf
}

impl DeviceBackend {
    pub fn new(config: &Config, cameras: Vec<CameraDevice>, microphones: Vec<AudioDevice>, camera_tx: Sender<CameraCommand>, rec_tx: Sender<RecorderCommand>, audio_tx: Sender<AudioCommand>) -> Self {
        Self {
            cameras,
            microphones,
            camera_tx,
            rec_tx,
            audio_tx,
            settings: config.video,
            pictures_dir: config.pictures_dir(),
            videos_dir: config.videos_dir(),
            audio_dir: config.audio_dir()
        }
    }

    pub fn camera_name(&self) -> Option<&str> {
        self.cameras.first().map(|c| c.name.as_str())
    }

    pub fn microphone_name(&self) -> Option<&str> {
        self.microphones.first().map(|m| m.name.as_str())
    }

    pub fn pictures_dir(&self) -> &Path {
        &self.pictures_dir
    }

    pub fn shutdown(&self) {
        let _ = self.camera_tx.send(CameraCommand::Shutdown);
    }

    fn send_camera(&self, cmd: CameraCommand) -> Result<()> {
        self.camera_tx.send(cmd).map_err(|_| MediaError::WorkerGone)
    }
}

impl CaptureBackend for DeviceBackend {
    fn has_camera(&self) -> bool {
        !self.cameras.is_empty()
    }

    fn has_microphone(&self) -> bool {
        !self.microphones.is_empty()
    }

    fn open_camera(&mut self) {
        if let Err(e) = self.send_camera(CameraCommand::Open) {
            debug!("Camera open failed: {}", e);
        }
    }

    fn close_camera(&mut self) {
        let _ = self.send_camera(CameraCommand::Close);
    }

    fn capture_photo(&mut self) -> Result<()> {
        if !self.has_camera() {
            return Err(MediaError::NoCamera);
        }
        self.send_camera(CameraCommand::Capture)
    }

    fn start_recording(&mut self, kind: Recording) -> Result<PathBuf> {
        match kind {
            Recording::Video => {
                if !self.has_camera() {
                    return Err(MediaError::NoCamera);
                }
                let output = recording_path(&self.videos_dir, "video", "mp4")?;
                self.rec_tx.send(RecorderCommand::Start {
                    output: output.clone(),
                    settings: self.settings,
                    with_audio: self.has_microphone()
                }).map_err(|_| MediaError::WorkerGone)?;
                self.send_camera(CameraCommand::Forward(true))?;
                Ok(output)
            },
            Recording::Audio => {
                if !self.has_microphone() {
                    return Err(MediaError::NoMicrophone);
                }
                let output = recording_path(&self.audio_dir, "audio", "wav")?;
                self.audio_tx.send(AudioCommand::StartRecording(output.clone())).map_err(|_| MediaError::WorkerGone)?;
                Ok(output)
            }
        }
    }

    fn pause_recording(&mut self, kind: Recording) {
        match kind {
            Recording::Video => { let _ = self.rec_tx.send(RecorderCommand::Pause); },
            Recording::Audio => { let _ = self.audio_tx.send(AudioCommand::Pause); }
        }
    }

    fn resume_recording(&mut self, kind: Recording) {
        match kind {
            Recording::Video => { let _ = self.rec_tx.send(RecorderCommand::Resume); },
            Recording::Audio => { let _ = self.audio_tx.send(AudioCommand::Resume); }
        }
    }

    fn stop_recording(&mut self, kind: Recording) {
        match kind {
            Recording::Video => {
                let _ = self.send_camera(CameraCommand::Forward(false));
                let _ = self.rec_tx.send(RecorderCommand::Stop);
            },
            Recording::Audio => {
                let _ = self.audio_tx.send(AudioCommand::StopRecording(None));
            }
        }
    }

    fn choose_photo_path(&mut self) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .set_title("Save Image")
            .add_filter("Images", &PHOTO_EXTENSIONS)
            .set_directory(&self.pictures_dir)
            .set_file_name(PHOTO_FILE_NAME)
            .save_file()
    }
}
