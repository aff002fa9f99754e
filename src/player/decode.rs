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

use super::output::AudioSink;
use crate::error::{MediaError, Result};
use crate::messages::player::{DecoderEvent, VideoFrame};
use crossbeam_channel::{SendTimeoutError, Sender};
use log::debug;
use std::{io::{ErrorKind, Read}, path::Path, process::{Child, ChildStdout, Command, Stdio}, sync::{Arc, atomic::{AtomicBool, Ordering}}, thread, time::Duration};

const AUDIO_CHUNK_BYTES: usize = 16 * 1024;

fn seconds(ms: u64) -> String {
    format!("{}.{:03}", ms / 1000, ms % 1000)
}

/// Raw RGBA frames at a constant rate, scaled to `width`x`height`.
pub fn build_video_cmd(path: &Path, start_ms: u64, width: u32, height: u32, fps: f64, max_frames: Option<u32>) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-v".into(), "error".into(),
        "-ss".into(), seconds(start_ms),
        "-i".into(), path.to_string_lossy().into_owned(),
        "-an".into(), "-sn".into(),
        "-vf".into(), format!("scale={}:{}", width, height),
        "-r".into(), format!("{:.3}", fps)
    ];
    if let Some(n) = max_frames {
        args.extend(["-frames:v".into(), n.to_string()]);
    }
    args.extend(["-f".into(), "rawvideo".into(), "-pix_fmt".into(), "rgba".into(), "pipe:1".into()]);
    args
}

/// Interleaved little-endian f32 samples of one audio track.
pub fn build_audio_cmd(path: &Path, start_ms: u64, track: usize, sample_rate: u32, channels: u16) -> Vec<String> {
    vec![
        "-v".into(), "error".into(),
        "-ss".into(), seconds(start_ms),
        "-i".into(), path.to_string_lossy().into_owned(),
        "-vn".into(), "-sn".into(),
        "-map".into(), format!("0:a:{}", track),
        "-ac".into(), channels.to_string(),
        "-ar".into(), sample_rate.to_string(),
        "-f".into(), "f32le".into(),
        "pipe:1".into()
    ]
}

/// A running ffmpeg decode. Dropping it kills the process.
pub struct Decoder {
    child: Child,
    stop: Arc<AtomicBool>
}

impl Decoder {
    pub fn spawn<F>(args: Vec<String>, reader: F) -> Result<Self>
    where
        F: FnOnce(ChildStdout, Arc<AtomicBool>) + Send + 'static
    {
        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| MediaError::Ffmpeg(format!("Failed to spawn decoder: {}", e)))?;
        let stdout = child.stdout.take().ok_or_else(|| MediaError::Ffmpeg(String::from("Decoder has no stdout")))?;
        let stop = Arc::new(AtomicBool::new(false));
        let flag = stop.clone();
        thread::spawn(move || reader(stdout, flag));
        Ok(Self { child, stop })
    }
}

impl Drop for Decoder {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Sends unless the session was stopped. Returns `false` when the reader should quit.
fn send(tx: &Sender<DecoderEvent>, mut event: DecoderEvent, stop: &AtomicBool) -> bool {
    loop {
        if stop.load(Ordering::Relaxed) {
            return false;
        }
        match tx.send_timeout(event, Duration::from_millis(50)) {
            Ok(()) => return true,
            Err(SendTimeoutError::Timeout(e)) => event = e,
            Err(SendTimeoutError::Disconnected(_)) => return false
        }
    }
}

/// Fills `buf` completely. `Ok(false)` on a clean end of stream.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => return Ok(false),
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {},
            Err(e) => return Err(e)
        }
    }
    Ok(true)
}

pub struct FrameLayout {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub start_ms: u64,
    pub session: u64
}

pub fn read_video<R: Read>(mut reader: R, layout: FrameLayout, tx: Sender<DecoderEvent>, stop: Arc<AtomicBool>) {
    let frame_len = layout.width as usize * layout.height as usize * 4;
    let mut index: u64 = 0;
    loop {
        let mut rgba = vec![0u8; frame_len];
        match read_full(&mut reader, &mut rgba) {
            Ok(true) => {},
            Ok(false) => break,
            Err(e) => {
                if !stop.load(Ordering::Relaxed) {
                    let _ = send(&tx, DecoderEvent::Error { session: layout.session, message: format!("Video read failed: {}", e) }, &stop);
                }
                return;
            }
        }
        let pts_ms = layout.start_ms + (index as f64 * 1000.0 / layout.fps) as u64;
        let frame = VideoFrame { rgba, width: layout.width, height: layout.height, pts_ms, session: layout.session };
        if !send(&tx, DecoderEvent::Frame(frame), &stop) {
            return;
        }
        index += 1;
    }
    debug!("Video decode session {} finished after {} frames", layout.session, index);
    let _ = send(&tx, DecoderEvent::EndOfStream { session: layout.session }, &stop);
}

pub fn read_audio<R: Read>(mut reader: R, sink: AudioSink, stop: Arc<AtomicBool>) {
    let mut bytes = vec![0u8; AUDIO_CHUNK_BYTES];
    let mut carry: Vec<u8> = Vec::new();
    loop {
        let n = match reader.read(&mut bytes) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!("Audio read stopped: {}", e);
                break;
            }
        };
        carry.extend_from_slice(&bytes[..n]);
        let whole = carry.len() / 4 * 4;
        let samples: Vec<f32> = carry[..whole].chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect();
        carry.drain(..whole);
        if !sink.push_all(&samples, &stop) {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn layout(session: u64) -> FrameLayout {
        FrameLayout { width: 2, height: 1, fps: 10.0, start_ms: 5_000, session }
    }

    #[test]
    fn video_args_limit_frames_for_stills() {
        let args = build_video_cmd(Path::new("/m/a.mkv"), 1_500, 640, 360, 29.97, Some(1));
        let joined = args.join(" ");
        assert!(joined.starts_with("-v error -ss 1.500 -i /m/a.mkv"));
        assert!(joined.contains("-vf scale=640:360"));
        assert!(joined.contains("-frames:v 1"));
        assert!(joined.ends_with("-f rawvideo -pix_fmt rgba pipe:1"));
    }

    #[test]
    fn audio_args_pick_track_and_device_format() {
        let args = build_audio_cmd(Path::new("a.mp4"), 0, 1, 48_000, 2);
        let joined = args.join(" ");
        assert!(joined.contains("-ss 0.000"));
        assert!(joined.contains("-map 0:a:1"));
        assert!(joined.contains("-ac 2 -ar 48000 -f f32le"));
    }

    #[test]
    fn video_reader_splits_frames_and_stamps_times() {
        // Two whole 2x1 frames and a truncated third.
        let data: Vec<u8> = (0..20).collect();
        let (tx, rx) = crossbeam_channel::unbounded();
        read_video(Cursor::new(data), layout(7), tx, Arc::new(AtomicBool::new(false)));

        let events: Vec<DecoderEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 3);
        match &events[1] {
            DecoderEvent::Frame(f) => {
                assert_eq!(f.pts_ms, 5_100);
                assert_eq!(f.rgba, vec![8, 9, 10, 11, 12, 13, 14, 15]);
                assert_eq!(f.session, 7);
            },
            _ => panic!("expected a frame")
        }
        assert!(matches!(events[2], DecoderEvent::EndOfStream { session: 7 }));
    }

    #[test]
    fn stopped_reader_sends_nothing() {
        let (tx, rx) = crossbeam_channel::unbounded();
        read_video(Cursor::new(vec![0u8; 16]), layout(1), tx, Arc::new(AtomicBool::new(true)));
        assert_eq!(rx.try_iter().count(), 0);
    }

    #[test]
    fn audio_reader_decodes_little_endian_floats() {
        let mut data = Vec::new();
        for v in [0.5f32, -0.25, 1.0] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        data.push(0xff);
        let sink = AudioSink::new(16);
        read_audio(Cursor::new(data), sink.clone(), Arc::new(AtomicBool::new(false)));
        assert_eq!(sink.len(), 3);
    }
}
