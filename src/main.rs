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

mod app;
mod audio;
mod camera;
mod clock;
mod config;
mod controller;
mod crop;
mod devices;
mod error;
mod keymap;
mod messages;
mod player;
mod recorder;
mod theme;

use anyhow::Context;
use crossbeam_channel::unbounded;
use eframe::NativeOptions;
use log::{info, warn};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = config::load().context("Failed to read settings")?;

    let cameras = camera::list_cameras();
    match cameras.first() {
        Some(cam) => info!("Found {} camera(s), using: {} (#{})", cameras.len(), cam.name, cam.index),
        None => warn!("No camera device found")
    }
    let microphones = audio::list_microphones();
    match microphones.first() {
        Some(mic) => info!("Found {} microphone(s), using: {} (#{})", microphones.len(), mic.name, mic.index),
        None => warn!("No microphone device found")
    }

    let (cam_tx, cam_rx) = unbounded();
    let (cam_command_tx, cam_command_rx) = unbounded();
    let (rec_command_tx, rec_command_rx) = unbounded();
    let (rec_status_tx, rec_status_rx) = unbounded();
    let (aud_tx, aud_rx) = unbounded();
    let (aud_command_tx, aud_command_rx) = unbounded();

    camera::start_camera_thread(cameras.first().cloned(), cam_tx, cam_command_rx, rec_command_tx.clone());
    audio::start_thread(aud_tx, aud_command_rx);
    recorder::start_thread(rec_command_rx, rec_status_tx, aud_command_tx.clone());

    let backend = devices::DeviceBackend::new(&config, cameras, microphones, cam_command_tx, rec_command_tx, aud_command_tx);
    let inbox = app::Inbox { camera_rx: cam_rx, audio_rx: aud_rx, rec_status: rec_status_rx };

    let options = NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("Mini Media")
            .with_inner_size([config.window_width, config.window_height]),
        ..Default::default()
    };

    eframe::run_native("Mini Media", options, Box::new(move |cc| {
        Ok(Box::new(app::MediaApp::new(cc, config, backend, inbox)))
    })).map_err(|e| anyhow::anyhow!("UI failed: {}", e))
}
