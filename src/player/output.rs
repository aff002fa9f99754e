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

//! Speaker output for the player.
//!
//! Decoder threads push interleaved f32 samples into an [`AudioSink`]; the
//! cpal callback drains it, applying volume and mute from atomics.

use crate::error::{MediaError, Result};
use cpal::{FromSample, Sample, SizedSample, traits::{DeviceTrait, HostTrait, StreamTrait}};
use log::{info, warn};
use std::{collections::VecDeque, sync::{Arc, Mutex, atomic::{AtomicBool, AtomicU32, Ordering}}, thread, time::Duration};

struct SharedState {
    volume_bits: AtomicU32,
    muted: AtomicBool,
    paused: AtomicBool
}

impl SharedState {
    fn new(volume: f32) -> Self {
        Self {
            volume_bits: AtomicU32::new(volume.to_bits()),
            muted: AtomicBool::new(false),
            paused: AtomicBool::new(true)
        }
    }

    fn volume(&self) -> f32 {
        f32::from_bits(self.volume_bits.load(Ordering::Relaxed))
    }
}

/// Bounded sample queue shared between a decoder thread and the output callback.
#[derive(Clone)]
pub struct AudioSink {
    buffer: Arc<Mutex<VecDeque<f32>>>,
    capacity: usize
}

impl AudioSink {
    pub fn new(capacity: usize) -> Self {
        Self { buffer: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))), capacity }
    }

    /// Queues as many samples as fit and returns how many were taken.
    pub fn push(&self, samples: &[f32]) -> usize {
        let Ok(mut buf) = self.buffer.lock() else { return 0 };
        let take = self.capacity.saturating_sub(buf.len()).min(samples.len());
        buf.extend(&samples[..take]);
        take
    }

    /// Queues every sample, waiting for room. Gives up once `stop` is set.
    pub fn push_all(&self, mut samples: &[f32], stop: &AtomicBool) -> bool {
        while !samples.is_empty() {
            if stop.load(Ordering::Relaxed) {
                return false;
            }
            let taken = self.push(samples);
            samples = &samples[taken..];
            if taken == 0 {
                thread::sleep(Duration::from_millis(10));
            }
        }
        true
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.buffer.lock().map(|b| b.len()).unwrap_or(0)
    }

    pub fn clear(&self) {
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }
    }

    fn pop(&self, count: usize) -> Vec<f32> {
        match self.buffer.lock() {
            Ok(mut buf) => {
                let n = count.min(buf.len());
                buf.drain(..n).collect()
            },
            Err(_) => Vec::new()
        }
    }
}

pub struct AudioOutput {
    shared: Arc<SharedState>,
    sink: AudioSink,
    sample_rate: u32,
    channels: u16,
    _stream: cpal::Stream
}

fn build_stream<T>(device: &cpal::Device, config: &cpal::StreamConfig, sink: AudioSink, shared: Arc<SharedState>) -> std::result::Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample + FromSample<f32>
{
    let data_fn = move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
        if shared.paused.load(Ordering::Relaxed) {
            data.fill(T::from_sample(0.0f32));
            return;
        }
        // Muted output still drains so audio stays in step with the clock.
        let samples = sink.pop(data.len());
        let gain = if shared.muted.load(Ordering::Relaxed) { 0.0 } else { shared.volume() };
        for (i, out) in data.iter_mut().enumerate() {
            let value = samples.get(i).copied().unwrap_or(0.0) * gain;
            *out = T::from_sample(value.clamp(-1.0, 0.999_999_9));
        }
    };
    let err_fn = |err: cpal::StreamError| warn!("Audio output error: {}", err);
    device.build_output_stream(config, data_fn, err_fn, None)
}

impl AudioOutput {
    pub fn new(volume: f32) -> Result<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| MediaError::Audio(String::from("No audio output device found")))?;
        let config = device.default_output_config().map_err(|e| MediaError::Audio(format!("Failed to get output config: {}", e)))?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels();
        // Half a second of audio.
        let sink = AudioSink::new(sample_rate as usize * channels as usize / 2);
        let shared = Arc::new(SharedState::new(volume));

        let stream_config: cpal::StreamConfig = config.config();
        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, sink.clone(), shared.clone()),
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, sink.clone(), shared.clone()),
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, sink.clone(), shared.clone()),
            other => return Err(MediaError::Audio(format!("Unsupported sample format: {}", other)))
        }.map_err(|e| MediaError::Audio(format!("Failed to build output stream: {}", e)))?;
        stream.play().map_err(|e| MediaError::Audio(format!("Failed to start output stream: {}", e)))?;

        info!("Audio output: {} Hz, {} channels", sample_rate, channels);
        Ok(Self { shared, sink, sample_rate, channels, _stream: stream })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sink(&self) -> AudioSink {
        self.sink.clone()
    }

    pub fn set_volume(&self, volume: f32) {
        self.shared.volume_bits.store(volume.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    pub fn set_muted(&self, muted: bool) {
        self.shared.muted.store(muted, Ordering::Relaxed);
    }

    pub fn set_paused(&self, paused: bool) {
        self.shared.paused.store(paused, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        self.sink.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_respects_capacity() {
        let sink = AudioSink::new(4);
        assert_eq!(sink.push(&[0.1, 0.2, 0.3]), 3);
        assert_eq!(sink.push(&[0.4, 0.5, 0.6]), 1);
        assert_eq!(sink.len(), 4);
        assert_eq!(sink.pop(2), vec![0.1, 0.2]);
        sink.clear();
        assert_eq!(sink.len(), 0);
    }

    #[test]
    fn push_all_gives_up_when_stopped() {
        let sink = AudioSink::new(2);
        let stop = AtomicBool::new(true);
        assert!(!sink.push_all(&[0.0; 8], &stop));

        let go = AtomicBool::new(false);
        assert!(sink.push_all(&[0.5, 0.5], &go));
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn volume_is_stored_as_bits() {
        let shared = SharedState::new(0.25);
        assert_eq!(shared.volume(), 0.25);
        assert!(shared.paused.load(Ordering::Relaxed));
    }
}
