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

use crate::controller::player::{MediaInfo, TrackInfo, VideoStream};
use crate::error::{MediaError, Result};
use serde::Deserialize;
use std::{collections::HashMap, path::Path, process::{Command, Stdio}};

const DEFAULT_FPS: f64 = 25.0;

#[derive(Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>
}

#[derive(Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    #[serde(default)]
    tags: HashMap<String, String>,
    #[serde(default)]
    disposition: HashMap<String, u8>
}

#[derive(Deserialize)]
struct ProbeFormat {
    duration: Option<String>
}

pub fn build_probe_cmd(path: &Path) -> Vec<String> {
    vec![
        "-v".into(), "error".into(),
        "-show_entries".into(),
        "format=duration:stream=codec_type,width,height,avg_frame_rate,r_frame_rate:stream_tags=language:stream_disposition=attached_pic".into(),
        "-of".into(), "json".into(),
        path.to_string_lossy().into_owned()
    ]
}

/// `"30000/1001"` or `"25"` to frames per second. `0/0` is not a rate.
fn parse_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let den: f64 = den.parse().ok()?;
            if den == 0.0 { return None; }
            num.parse::<f64>().ok()? / den
        },
        None => rate.parse().ok()?
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

pub fn parse_probe(json: &str) -> std::result::Result<MediaInfo, String> {
    let output: ProbeOutput = serde_json::from_str(json).map_err(|e| format!("Bad ffprobe output: {}", e))?;

    let duration_ms = output.format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .map(|d| (d * 1000.0).round() as u64)
        .unwrap_or(0);

    let video = output.streams.iter()
        .filter(|s| s.codec_type.as_deref() == Some("video"))
        .filter(|s| s.disposition.get("attached_pic").copied().unwrap_or(0) == 0)
        .find_map(|s| {
            let fps = s.avg_frame_rate.as_deref().and_then(parse_rate)
                .or_else(|| s.r_frame_rate.as_deref().and_then(parse_rate))
                .unwrap_or(DEFAULT_FPS);
            match (s.width, s.height) {
                (Some(width), Some(height)) if width > 0 && height > 0 => Some(VideoStream { width, height, fps }),
                _ => None
            }
        });

    let audio_tracks: Vec<TrackInfo> = output.streams.iter()
        .filter(|s| s.codec_type.as_deref() == Some("audio"))
        .map(|s| TrackInfo { language: s.tags.get("language").cloned() })
        .collect();

    if video.is_none() && audio_tracks.is_empty() {
        return Err(String::from("No audio or video streams"));
    }
    Ok(MediaInfo { duration_ms, video, audio_tracks })
}

pub fn probe(path: &Path) -> Result<MediaInfo> {
    let output = Command::new("ffprobe")
        .args(build_probe_cmd(path))
        .stdin(Stdio::null())
        .output()
        .map_err(|e| MediaError::Probe { path: path.to_path_buf(), reason: format!("Failed to run ffprobe: {}", e) })?;
    if !output.status.success() {
        let reason = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(MediaError::Probe { path: path.to_path_buf(), reason });
    }
    parse_probe(&String::from_utf8_lossy(&output.stdout)).map_err(|reason| MediaError::Probe { path: path.to_path_buf(), reason })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOVIE: &str = r#"{
        "streams": [
            { "codec_type": "video", "width": 1920, "height": 1080, "avg_frame_rate": "30000/1001", "r_frame_rate": "30000/1001", "disposition": { "attached_pic": 0 } },
            { "codec_type": "audio", "avg_frame_rate": "0/0", "tags": { "language": "eng" } },
            { "codec_type": "audio", "avg_frame_rate": "0/0" }
        ],
        "format": { "duration": "12.345000" }
    }"#;

    #[test]
    fn parses_streams_and_duration() {
        let info = parse_probe(MOVIE).expect("valid probe output");
        assert_eq!(info.duration_ms, 12_345);
        let video = info.video.expect("video stream");
        assert_eq!((video.width, video.height), (1920, 1080));
        assert!((video.fps - 29.97).abs() < 0.01);
        assert_eq!(info.audio_tracks.len(), 2);
        assert_eq!(info.audio_tracks[0].label(), "eng");
        assert_eq!(info.audio_tracks[1].label(), "Unknown Language");
    }

    #[test]
    fn cover_art_is_not_video() {
        let json = r#"{
            "streams": [
                { "codec_type": "audio" },
                { "codec_type": "video", "width": 500, "height": 500, "disposition": { "attached_pic": 1 } }
            ],
            "format": { "duration": "3.0" }
        }"#;
        let info = parse_probe(json).expect("valid probe output");
        assert!(info.video.is_none());
        assert_eq!(info.duration_ms, 3_000);
    }

    #[test]
    fn missing_rate_and_duration_fall_back() {
        let json = r#"{ "streams": [ { "codec_type": "video", "width": 64, "height": 48, "avg_frame_rate": "0/0" } ], "format": {} }"#;
        let info = parse_probe(json).expect("valid probe output");
        assert_eq!(info.duration_ms, 0);
        assert_eq!(info.video.map(|v| v.fps), Some(DEFAULT_FPS));
    }

    #[test]
    fn rejects_files_without_media_streams() {
        assert!(parse_probe(r#"{ "streams": [ { "codec_type": "data" } ] }"#).is_err());
        assert!(parse_probe("garbage").is_err());
    }

    #[test]
    fn rate_parsing() {
        assert_eq!(parse_rate("25/1"), Some(25.0));
        assert_eq!(parse_rate("24"), Some(24.0));
        assert_eq!(parse_rate("0/0"), None);
        assert_eq!(parse_rate("x/1"), None);
    }
}
