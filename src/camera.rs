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

use crate::messages::{camera::{CameraCommand, CameraDevice, CameraMessage, StreamFormat}, recorder::RecorderCommand};
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use image::imageops::FilterType;
use log::{debug, info, warn};
use nokhwa::{Camera, pixel_format::RgbFormat, utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType}};
use std::{sync::Arc, thread, time::Duration};

const PREVIEW_WIDTH: u32 = 854;
const PREVIEW_HEIGHT: u32 = 480;

pub fn list_cameras() -> Vec<CameraDevice> {
    match nokhwa::query(ApiBackend::Auto) {
        Ok(infos) => infos.iter().enumerate().map(|(i, info)| {
            CameraDevice {
                name: info.human_name(),
                index: info.index().as_index().unwrap_or(i as u32)
            }
        }).collect(),
        Err(e) => {
            warn!("Camera query failed: {}", e);
            Vec::new()
        }
    }
}

/// Largest size with the frame's aspect ratio that fits the preview box.
pub fn preview_size(width: u32, height: u32) -> (u32, u32) {
    if width <= PREVIEW_WIDTH && height <= PREVIEW_HEIGHT {
        return (width, height);
    }
    let scale = (PREVIEW_WIDTH as f32 / width as f32).min(PREVIEW_HEIGHT as f32 / height as f32);
    (((width as f32 * scale).round() as u32).max(1), ((height as f32 * scale).round() as u32).max(1))
}

fn open_camera(device: &CameraDevice) -> Result<(Camera, StreamFormat), nokhwa::NokhwaError> {
    let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
    let mut camera = Camera::new(CameraIndex::Index(device.index), requested)?;
    camera.open_stream()?;
    let fmt = camera.camera_format();
    let format = StreamFormat {
        width: fmt.resolution().width(),
        height: fmt.resolution().height(),
        fps: fmt.frame_rate()
    };
    Ok((camera, format))
}

pub fn start_camera_thread(device: Option<CameraDevice>, tx: Sender<CameraMessage>, cmd_rx: Receiver<CameraCommand>, rec_tx: Sender<RecorderCommand>) {
    thread::spawn(move || {
        let mut camera: Option<Camera> = None;
        let mut forward = false;
        let mut capture_pending = false;

        loop {
            let cmd = if camera.is_some() {
                match cmd_rx.try_recv() {
                    Ok(c) => Some(c),
                    Err(TryRecvError::Empty) => None,
                    Err(TryRecvError::Disconnected) => break
                }
            } else {
                match cmd_rx.recv() {
                    Ok(c) => Some(c),
                    Err(_) => break
                }
            };

            if let Some(cmd) = cmd {
                match cmd {
                    CameraCommand::Open => {
                        if camera.is_some() { continue; }
                        let Some(dev) = &device else {
                            let _ = tx.send(CameraMessage::Error(String::from("No camera device found")));
                            continue;
                        };
                        match open_camera(dev) {
                            Ok((c, format)) => {
                                info!("Camera started with device: {} ({})", dev.name, format);
                                let _ = rec_tx.send(RecorderCommand::Configure(format));
                                let _ = tx.send(CameraMessage::StreamStarted(format));
                                camera = Some(c);
                            },
                            Err(e) => { let _ = tx.send(CameraMessage::Error(format!("Camera initialization failed: {}", e))); }
                        }
                    },
                    CameraCommand::Close => {
                        if let Some(mut c) = camera.take() {
                            if let Err(e) = c.stop_stream() {
                                warn!("Failed to stop camera stream: {}", e);
                            }
                            debug!("Camera closed");
                        }
                        forward = false;
                        capture_pending = false;
                    },
                    CameraCommand::Capture => {
                        if camera.is_some() {
                            capture_pending = true;
                        } else {
                            let _ = tx.send(CameraMessage::Error(String::from("Camera not started")));
                        }
                    },
                    CameraCommand::Forward(on) => forward = on,
                    CameraCommand::Shutdown => break
                }
                continue;
            }

            let Some(cam) = camera.as_mut() else { continue };
            let frame = match cam.frame() {
                Ok(f) => f,
                Err(e) => {
                    debug!("Camera frame error: {}", e);
                    thread::sleep(Duration::from_millis(10));
                    continue;
                }
            };

            let decoded = match frame.decode_image::<RgbFormat>() {
                Ok(d) => d,
                Err(e) => {
                    debug!("Camera frame decode error: {}", e);
                    continue;
                }
            };

            if capture_pending {
                capture_pending = false;
                let _ = tx.send(CameraMessage::Photo(decoded.clone()));
            }

            let (width, height) = preview_size(decoded.width(), decoded.height());
            let preview = if (width, height) == (decoded.width(), decoded.height()) {
                decoded.clone()
            } else {
                image::imageops::resize(&decoded, width, height, FilterType::Nearest)
            };

            if forward {
                let _ = rec_tx.send(RecorderCommand::WriteFrame(Arc::new(decoded.into_raw())));
            }

            if tx.send(CameraMessage::Frame { rgb: Arc::new(preview.into_raw()), width, height }).is_err() {
                break;
            }
        }

        if let Some(mut c) = camera.take() {
            let _ = c.stop_stream();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_frames_keep_their_size() {
        assert_eq!(preview_size(640, 480), (640, 480));
    }

    #[test]
    fn large_frames_fit_preview_box() {
        let (w, h) = preview_size(1920, 1080);
        assert!(w <= PREVIEW_WIDTH && h <= PREVIEW_HEIGHT);
        assert_eq!((w, h), (853, 480));
    }
}
