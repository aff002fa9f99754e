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

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("no camera device found")]
    NoCamera,
    #[error("no microphone device found")]
    NoMicrophone,
    #[error("unsupported file type: {0}")]
    UnsupportedFile(PathBuf),
    #[error("failed to load image {path}: {source}")]
    ImageLoad { path: PathBuf, source: image::ImageError },
    #[error("failed to save image {path}: {source}")]
    ImageSave { path: PathBuf, source: image::ImageError },
    #[error("failed to probe {path}: {reason}")]
    Probe { path: PathBuf, reason: String },
    #[error("ffmpeg failed: {0}")]
    Ffmpeg(String),
    #[error("audio device error: {0}")]
    Audio(String),
    #[error("worker thread is gone")]
    WorkerGone,
    #[error(transparent)]
    Io(#[from] std::io::Error)
}

pub type Result<T> = std::result::Result<T, MediaError>;
