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

//! Playback engine built on ffmpeg subprocesses.
//!
//! Every play or seek starts a new decode session. Video frames come back over
//! a channel tagged with their session so frames from a cancelled session are
//! dropped; audio goes straight into the output sink. A [`Stopwatch`] is the
//! master clock and frames are shown once their timestamp has passed.

mod decode;
mod output;
mod probe;

use crate::clock::Stopwatch;
use crate::controller::player::{MediaInfo, PlaybackEngine, PlaybackState};
use crate::error::Result;
use crate::messages::player::{DecoderEvent, VideoFrame};
use crossbeam_channel::{Receiver, Sender};
use decode::{Decoder, FrameLayout};
use log::{debug, info, warn};
use output::AudioOutput;
use std::{path::{Path, PathBuf}, time::Duration};

const MAX_FRAME_WIDTH: u32 = 1280;
const MAX_FRAME_HEIGHT: u32 = 720;
const FRAME_QUEUE: usize = 4;

/// Fits a video into the decode size limit, never upscaling. Sides stay even.
pub fn frame_size(width: u32, height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    let scale = (MAX_FRAME_WIDTH as f64 / width as f64).min(MAX_FRAME_HEIGHT as f64 / height as f64).min(1.0);
    let even = |v: f64| ((v.round() as u32) / 2 * 2).max(2);
    (even(width as f64 * scale), even(height as f64 * scale))
}

pub struct FfmpegPlayer {
    path: Option<PathBuf>,
    info: MediaInfo,
    state: PlaybackState,
    clock: Stopwatch,
    audio_track: usize,
    output: Option<AudioOutput>,
    session: u64,
    decoders: Vec<Decoder>,
    events_tx: Sender<DecoderEvent>,
    events_rx: Receiver<DecoderEvent>,
    pending: Option<VideoFrame>,
    frame: Option<VideoFrame>,
    frame_revision: u64,
    video_ended: bool
}

impl FfmpegPlayer {
    /// Playback without a speaker still shows video.
    pub fn new(volume: f32) -> Self {
        let output = match AudioOutput::new(volume) {
            Ok(o) => Some(o),
            Err(e) => {
                warn!("Playing without sound: {}", e);
                None
            }
        };
        let (events_tx, events_rx) = crossbeam_channel::bounded(FRAME_QUEUE);
        Self {
            path: None,
            info: MediaInfo::default(),
            state: PlaybackState::Stopped,
            clock: Stopwatch::new(),
            audio_track: 0,
            output,
            session: 0,
            decoders: Vec::new(),
            events_tx,
            events_rx,
            pending: None,
            frame: None,
            frame_revision: 0,
            video_ended: false
        }
    }

    /// Latest frame due for display.
    pub fn frame(&self) -> Option<&VideoFrame> {
        self.frame.as_ref()
    }

    /// Bumped whenever [`frame`](Self::frame) changes.
    pub fn frame_revision(&self) -> u64 {
        self.frame_revision
    }

    fn duration(&self) -> u64 {
        self.info.duration_ms
    }

    fn stop_decoders(&mut self) {
        self.session += 1;
        self.decoders.clear();
        self.pending = None;
        self.video_ended = false;
        if let Some(output) = &self.output {
            output.clear();
        }
        // Leftovers belong to dead sessions.
        while self.events_rx.try_recv().is_ok() {}
    }

    fn start_decoders(&mut self, start_ms: u64, max_frames: Option<u32>) {
        self.stop_decoders();
        let Some(path) = self.path.clone() else { return };

        if let Some(stream) = self.info.video {
            let (width, height) = frame_size(stream.width, stream.height);
            let args = decode::build_video_cmd(&path, start_ms, width, height, stream.fps, max_frames);
            let layout = FrameLayout { width, height, fps: stream.fps, start_ms, session: self.session };
            let tx = self.events_tx.clone();
            match Decoder::spawn(args, move |stdout, stop| decode::read_video(stdout, layout, tx, stop)) {
                Ok(d) => self.decoders.push(d),
                Err(e) => warn!("Video decode failed: {}", e)
            }
        }

        if max_frames.is_some() || self.info.audio_tracks.is_empty() {
            return;
        }
        if let Some(output) = &self.output {
            let track = self.audio_track.min(self.info.audio_tracks.len() - 1);
            let args = decode::build_audio_cmd(&path, start_ms, track, output.sample_rate(), output.channels());
            let sink = output.sink();
            match Decoder::spawn(args, move |stdout, stop| decode::read_audio(stdout, sink, stop)) {
                Ok(d) => self.decoders.push(d),
                Err(e) => warn!("Audio decode failed: {}", e)
            }
        }
        debug!("Decode session {} from {} ms", self.session, start_ms);
    }

    fn set_output_paused(&self, paused: bool) {
        if let Some(output) = &self.output {
            output.set_paused(paused);
        }
    }

    fn finish(&mut self) {
        self.stop_decoders();
        self.clock.pause();
        if self.duration() > 0 {
            self.clock.set(Duration::from_millis(self.duration()));
        }
        self.set_output_paused(true);
        self.state = PlaybackState::Paused;
        info!("Playback reached the end");
    }

    fn show(&mut self, frame: VideoFrame) {
        self.frame = Some(frame);
        self.frame_revision += 1;
    }

    fn drain_events(&mut self) {
        let position = self.clock.elapsed_ms();
        loop {
            let frame = match self.pending.take() {
                Some(f) => f,
                None => match self.events_rx.try_recv() {
                    Ok(DecoderEvent::Frame(f)) if f.session == self.session => f,
                    Ok(DecoderEvent::EndOfStream { session }) if session == self.session => {
                        self.video_ended = true;
                        continue;
                    },
                    Ok(DecoderEvent::Error { session, message }) if session == self.session => {
                        warn!("{}", message);
                        continue;
                    },
                    Ok(_) => continue,
                    Err(_) => break
                }
            };
            if frame.pts_ms <= position || self.state != PlaybackState::Playing {
                self.show(frame);
            } else {
                self.pending = Some(frame);
                break;
            }
        }
    }
}

impl PlaybackEngine for FfmpegPlayer {
    fn open(&mut self, path: &Path) -> Result<MediaInfo> {
        let info = probe::probe(path)?;
        self.stop();
        info!("Opened {} ({} ms, {} audio tracks)", path.display(), info.duration_ms, info.audio_tracks.len());
        self.path = Some(path.to_path_buf());
        self.info = info.clone();
        self.audio_track = 0;
        Ok(info)
    }

    fn play(&mut self) {
        if self.path.is_none() || self.state == PlaybackState::Playing {
            return;
        }
        if self.duration() > 0 && self.clock.elapsed_ms() >= self.duration() {
            self.clock.reset();
        }
        let start = self.clock.elapsed_ms();
        self.start_decoders(start, None);
        self.set_output_paused(false);
        self.clock.start();
        self.state = PlaybackState::Playing;
    }

    fn pause(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.clock.pause();
        self.stop_decoders();
        self.set_output_paused(true);
        self.state = PlaybackState::Paused;
    }

    fn stop(&mut self) {
        self.stop_decoders();
        self.set_output_paused(true);
        self.clock.reset();
        self.frame = None;
        self.frame_revision += 1;
        self.state = PlaybackState::Stopped;
    }

    fn seek(&mut self, position_ms: u64) {
        let position = match self.duration() {
            0 => position_ms,
            d => position_ms.min(d)
        };
        self.clock.set(Duration::from_millis(position));
        match self.state {
            PlaybackState::Playing => self.start_decoders(position, None),
            // Decode a single frame so the paused picture follows the slider.
            PlaybackState::Paused => self.start_decoders(position, Some(1)),
            PlaybackState::Stopped => {}
        }
    }

    fn set_volume(&mut self, volume: f32) {
        if let Some(output) = &self.output {
            output.set_volume(volume);
        }
    }

    fn set_muted(&mut self, muted: bool) {
        if let Some(output) = &self.output {
            output.set_muted(muted);
        }
    }

    fn set_audio_track(&mut self, index: usize) {
        if index >= self.info.audio_tracks.len() {
            return;
        }
        self.audio_track = index;
        if self.state == PlaybackState::Playing {
            let position = self.clock.elapsed_ms();
            self.start_decoders(position, None);
        }
    }

    fn poll(&mut self) {
        self.drain_events();
        if self.state != PlaybackState::Playing {
            return;
        }
        let past_end = self.duration() > 0 && self.clock.elapsed_ms() >= self.duration();
        let video_only_done = self.video_ended && self.pending.is_none() && self.info.audio_tracks.is_empty();
        if past_end || video_only_done {
            self.finish();
        }
    }

    fn state(&self) -> PlaybackState {
        self.state
    }

    fn position_ms(&self) -> u64 {
        match self.duration() {
            0 => self.clock.elapsed_ms(),
            d => self.clock.elapsed_ms().min(d)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_size_never_upscales() {
        assert_eq!(frame_size(640, 480), (640, 480));
        assert_eq!(frame_size(1920, 1080), (1280, 720));
        assert_eq!(frame_size(3840, 1600), (1280, 532));
        assert_eq!(frame_size(0, 100), (0, 0));
    }

    #[test]
    fn odd_sizes_become_even() {
        assert_eq!(frame_size(641, 361), (640, 360));
        assert_eq!(frame_size(1, 1), (2, 2));
    }
}
