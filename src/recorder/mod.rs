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

pub mod types;
mod ffmpeg;

use crate::messages::{audio::AudioCommand, camera::StreamFormat, recorder::{RecorderCommand, RecorderStatus}};
use crossbeam_channel::{Receiver, Sender};
use log::{debug, info, warn};
use std::{fs, io::Write, path::{Path, PathBuf}, process::{Child, Command, Stdio}, thread};

/// Intermediate files written next to the final output while recording.
pub fn temp_paths(output: &Path) -> (PathBuf, PathBuf) {
    let stem = output.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| String::from("recording"));
    (
        output.with_file_name(format!(".{}.video.mp4", stem)),
        output.with_file_name(format!(".{}.audio.wav", stem))
    )
}

struct Session {
    process: Child,
    output: PathBuf,
    temp_video: PathBuf,
    temp_audio: Option<PathBuf>,
    frame_len: usize,
    paused: bool
}

fn finish_session(mut session: Session, aud_tx: &Sender<AudioCommand>) -> Result<PathBuf, String> {
    drop(session.process.stdin.take());
    match session.process.wait() {
        Ok(s) if s.success() => {},
        Ok(s) => warn!("Video encoder exited with {}", s),
        Err(e) => warn!("Video process wait error: {}", e)
    }

    let audio = match session.temp_audio.take() {
        Some(_) => {
            let (ack_tx, ack_rx) = crossbeam_channel::bounded(1);
            if let Err(e) = aud_tx.send(AudioCommand::StopRecording(Some(ack_tx))) {
                warn!("Audio thread unavailable: {}", e);
                None
            } else {
                ack_rx.recv().unwrap_or_else(|_| {
                    warn!("Audio thread disconnected unexpectedly during flush");
                    None
                })
            }
        },
        None => None
    };

    if !session.temp_video.exists() {
        if let Some(a) = &audio { let _ = fs::remove_file(a); }
        return Err(String::from("Temp files missing, recording failed"));
    }

    match audio {
        Some(audio_path) if audio_path.exists() => {
            debug!("Merging to {}", session.output.display());
            let args = ffmpeg::build_merge_cmd(&session.temp_video, &audio_path, &session.output);
            let merge = Command::new("ffmpeg").args(&args).stdout(Stdio::null()).stderr(Stdio::null()).status();
            let _ = fs::remove_file(&audio_path);
            match merge {
                Ok(s) if s.success() => {
                    let _ = fs::remove_file(&session.temp_video);
                    Ok(session.output)
                },
                _ => {
                    // Keep the silent video rather than losing the take.
                    fs::rename(&session.temp_video, &session.output).map_err(|e| format!("Merge failed: {}", e))?;
                    warn!("Audio merge failed, saved video without sound");
                    Ok(session.output)
                }
            }
        },
        _ => {
            fs::rename(&session.temp_video, &session.output).map_err(|e| format!("Failed to move recording: {}", e))?;
            Ok(session.output)
        }
    }
}

pub fn start_thread(cmd_rx: Receiver<RecorderCommand>, status_tx: Sender<RecorderStatus>, aud_tx: Sender<AudioCommand>) {
    thread::spawn(move || {
        let mut format: Option<StreamFormat> = None;
        let mut session: Option<Session> = None;

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                RecorderCommand::Configure(f) => {
                    info!("Recorder config updated: {}", f);
                    format = Some(f);
                },
                RecorderCommand::Start { output, settings, with_audio } => {
                    if session.is_some() {
                        warn!("Already recording");
                        continue;
                    }
                    let Some(f) = format else {
                        let _ = status_tx.send(RecorderStatus::Error(String::from("Camera stream not started")));
                        continue;
                    };

                    let (temp_video, temp_audio) = temp_paths(&output);
                    let args = ffmpeg::build_cmd(f.width, f.height, f.fps, settings, &temp_video);
                    debug!("Spawning ffmpeg ({}) {:?}", settings, args);
                    let child = Command::new("ffmpeg").args(&args).stdin(Stdio::piped()).stdout(Stdio::null()).stderr(Stdio::null()).spawn();
                    match child {
                        Ok(process) => {
                            let temp_audio = if with_audio {
                                match aud_tx.send(AudioCommand::StartRecording(temp_audio.clone())) {
                                    Ok(_) => Some(temp_audio),
                                    Err(e) => {
                                        warn!("Audio thread lost: {}", e);
                                        None
                                    }
                                }
                            } else {
                                None
                            };
                            session = Some(Session {
                                process,
                                output: output.clone(),
                                temp_video,
                                temp_audio,
                                frame_len: (f.width * f.height * 3) as usize,
                                paused: false
                            });
                            let _ = status_tx.send(RecorderStatus::Started(output));
                        },
                        Err(e) => { let _ = status_tx.send(RecorderStatus::Error(format!("Failed to spawn ffmpeg: {}", e))); }
                    }
                },
                RecorderCommand::WriteFrame(data) => {
                    let Some(s) = &mut session else { continue };
                    if s.paused { continue; }
                    if data.len() != s.frame_len {
                        debug!("Dropping frame of {} bytes, expected {}", data.len(), s.frame_len);
                        continue;
                    }
                    if let Some(stdin) = &mut s.process.stdin {
                        if let Err(e) = stdin.write_all(&data) {
                            warn!("Encoder pipe closed: {}", e);
                            s.process.stdin = None;
                        }
                    }
                },
                RecorderCommand::Pause => {
                    if let Some(s) = &mut session {
                        s.paused = true;
                        if s.temp_audio.is_some() { let _ = aud_tx.send(AudioCommand::Pause); }
                    }
                },
                RecorderCommand::Resume => {
                    if let Some(s) = &mut session {
                        s.paused = false;
                        if s.temp_audio.is_some() { let _ = aud_tx.send(AudioCommand::Resume); }
                    }
                },
                RecorderCommand::Stop => {
                    let Some(s) = session.take() else {
                        debug!("Stop requested while not recording");
                        continue;
                    };
                    match finish_session(s, &aud_tx) {
                        Ok(path) => {
                            info!("Recording saved: {}", path.display());
                            let _ = status_tx.send(RecorderStatus::Saved(path));
                        },
                        Err(e) => { let _ = status_tx.send(RecorderStatus::Error(e)); }
                    }
                }
            }
        }

        if let Some(s) = session.take() {
            let _ = finish_session(s, &aud_tx);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_files_sit_beside_output() {
        let (video, audio) = temp_paths(Path::new("/tmp/out/video_1.mp4"));
        assert_eq!(video, PathBuf::from("/tmp/out/.video_1.video.mp4"));
        assert_eq!(audio, PathBuf::from("/tmp/out/.video_1.audio.wav"));
    }

    #[test]
    fn stop_without_session_reports_nothing() {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let (status_tx, status_rx) = crossbeam_channel::unbounded();
        let (aud_tx, _aud_rx) = crossbeam_channel::unbounded();
        start_thread(cmd_rx, status_tx, aud_tx);

        cmd_tx.send(RecorderCommand::Stop).expect("recorder thread alive");
        drop(cmd_tx);
        assert!(status_rx.recv().is_err());
    }

    #[test]
    fn start_before_camera_is_an_error() {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
        let (status_tx, status_rx) = crossbeam_channel::unbounded();
        let (aud_tx, _aud_rx) = crossbeam_channel::unbounded();
        start_thread(cmd_rx, status_tx, aud_tx);

        cmd_tx.send(RecorderCommand::Start {
            output: PathBuf::from("never.mp4"),
            settings: types::EncoderSettings::default(),
            with_audio: false
        }).expect("recorder thread alive");
        match status_rx.recv() {
            Ok(RecorderStatus::Error(msg)) => assert!(msg.contains("Camera")),
            _ => panic!("expected an error status")
        }
    }
}
