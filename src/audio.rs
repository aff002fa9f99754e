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

use crate::messages::audio::{AudioCommand, AudioDevice, AudioMessage};
use crossbeam_channel::{Receiver, Sender};
use cpal::{FromSample, Sample, SizedSample, StreamError, traits::{DeviceTrait, HostTrait, StreamTrait}};
use log::{debug, info, warn};
use std::{fs::File, io::BufWriter, path::PathBuf, sync::{Arc, Mutex, atomic::{AtomicBool, Ordering}}, thread};

type WavWriterHandle = Arc<Mutex<Option<hound::WavWriter<BufWriter<File>>>>>;

pub fn list_microphones() -> Vec<AudioDevice> {
    let host = cpal::default_host();
    match host.input_devices() {
        Ok(devs) => devs.enumerate().map(|(i, d)| {
            AudioDevice {
                name: d.name().unwrap_or_else(|_| format!("Unknown device: {}", i)),
                index: i
            }
        }).collect(),
        Err(e) => {
            warn!("Audio host error: {}", e);
            Vec::new()
        }
    }
}

fn build_stream<T>(device: &cpal::Device, config: &cpal::StreamConfig, writer: WavWriterHandle, paused: Arc<AtomicBool>, msg_tx: Sender<AudioMessage>) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample,
    f32: FromSample<T>
{
    let err_fn = move |err: StreamError| { let _ = msg_tx.send(AudioMessage::Error(format!("Stream lost: {}", err))); };
    let data_fn = move |data: &[T], _: &cpal::InputCallbackInfo| {
        if paused.load(Ordering::Relaxed) { return; }
        if let Ok(mut guard) = writer.lock() {
            if let Some(writer) = guard.as_mut() {
                for &sample in data {
                    let _ = writer.write_sample(sample.to_sample::<f32>());
                }
            }
        }
    };
    device.build_input_stream(config, data_fn, err_fn, None)
}

fn finish(writer_handle: &WavWriterHandle, path: Option<PathBuf>) -> Result<Option<PathBuf>, String> {
    let writer = match writer_handle.lock() {
        Ok(mut guard) => guard.take(),
        Err(_) => return Err(String::from("Audio mutex poisoned"))
    };
    match writer {
        Some(w) => w.finalize().map(|_| path).map_err(|e| format!("Failed to flush audio to disk: {}", e)),
        None => Ok(None)
    }
}

pub fn start_thread(msg_tx: Sender<AudioMessage>, cmd_rx: Receiver<AudioCommand>) {
    thread::spawn(move || {
        let host: cpal::Host = cpal::default_host();
        let devices = match host.input_devices() {
            Ok(devs) => devs.collect::<Vec<_>>(),
            Err(e) => {
                let _ = msg_tx.send(AudioMessage::Error(format!("Audio host error: {}", e)));
                Vec::new()
            }
        };

        let mut active_stream: Option<(cpal::Stream, hound::WavSpec)> = None;
        let mut current_path: Option<PathBuf> = None;
        let writer_handle: WavWriterHandle = Arc::new(Mutex::new(None));
        let paused = Arc::new(AtomicBool::new(false));

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                AudioCommand::StartRecording(path) => {
                    let device = match devices.first() {
                        Some(d) => d,
                        None => {
                            let _ = msg_tx.send(AudioMessage::Error(String::from("No microphone device available")));
                            continue;
                        }
                    };

                    if active_stream.is_none() {
                        let config = match device.default_input_config() {
                            Ok(c) => c,
                            Err(e) => {
                                let _ = msg_tx.send(AudioMessage::Error(format!("Failed to get microphone config: {}", e)));
                                continue;
                            }
                        };

                        let spec = hound::WavSpec {
                            channels: config.channels(),
                            sample_rate: config.sample_rate().0,
                            bits_per_sample: 32,
                            sample_format: hound::SampleFormat::Float
                        };

                        let stream_config: cpal::StreamConfig = config.config();
                        let built = match config.sample_format() {
                            cpal::SampleFormat::F32 => build_stream::<f32>(device, &stream_config, writer_handle.clone(), paused.clone(), msg_tx.clone()),
                            cpal::SampleFormat::I16 => build_stream::<i16>(device, &stream_config, writer_handle.clone(), paused.clone(), msg_tx.clone()),
                            cpal::SampleFormat::U16 => build_stream::<u16>(device, &stream_config, writer_handle.clone(), paused.clone(), msg_tx.clone()),
                            other => {
                                let _ = msg_tx.send(AudioMessage::Error(format!("Unsupported sample format: {}", other)));
                                continue;
                            }
                        };

                        match built {
                            Ok(s) => {
                                if let Err(e) = s.play() {
                                    let _ = msg_tx.send(AudioMessage::Error(format!("Failed to play stream: {}", e)));
                                    continue;
                                }
                                active_stream = Some((s, spec));
                            },
                            Err(e) => {
                                let _ = msg_tx.send(AudioMessage::Error(format!("Failed to build stream: {}", e)));
                                continue;
                            }
                        }
                    }

                    let Some((_, spec)) = &active_stream else { continue };
                    match hound::WavWriter::create(&path, *spec) {
                        Ok(writer) => {
                            if let Ok(mut guard) = writer_handle.lock() {
                                *guard = Some(writer);
                                paused.store(false, Ordering::Relaxed);
                                current_path = Some(path.clone());
                                info!("Audio recording started: {}", path.display());
                            } else {
                                let _ = msg_tx.send(AudioMessage::Error(String::from("Audio mutex poisoned")));
                            }
                        },
                        Err(e) => {
                            let _ = msg_tx.send(AudioMessage::Error(format!("Could not create WAV file: {}", e)));
                        }
                    }
                },
                AudioCommand::Pause => {
                    paused.store(true, Ordering::Relaxed);
                    debug!("Audio recording paused");
                },
                AudioCommand::Resume => {
                    paused.store(false, Ordering::Relaxed);
                    debug!("Audio recording resumed");
                },
                AudioCommand::StopRecording(ack_tx) => {
                    paused.store(false, Ordering::Relaxed);
                    let result = finish(&writer_handle, current_path.take());
                    if let Err(e) = &result {
                        let _ = msg_tx.send(AudioMessage::Error(e.clone()));
                    }
                    let saved = result.ok().flatten();
                    match ack_tx {
                        Some(ack) => { let _ = ack.send(saved); },
                        None => {
                            if let Some(path) = saved {
                                info!("Audio recording saved: {}", path.display());
                                let _ = msg_tx.send(AudioMessage::RecordingSaved(path));
                            }
                        }
                    }
                }
            }
        }
    });
}
