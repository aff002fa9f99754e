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

use super::types::{EncoderPreset, EncoderSettings, EncodingQuality, EncodingSpeed};
use std::path::Path;

/// Arguments for an ffmpeg process that reads packed rgb24 frames from stdin.
pub fn build_cmd(width: u32, height: u32, fps: u32, settings: EncoderSettings, filename: &Path) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-f".into(), "rawvideo".into(),
        "-pixel_format".into(), "rgb24".into(),
        "-video_size".into(), format!("{}x{}", width, height),
        "-framerate".into(), fps.max(1).to_string(),
        "-i".into(), "-".into()
    ];

    let enc_args = match settings.encoder {
        EncoderPreset::Cpu => {
            let preset = match settings.speed {
                EncodingSpeed::Fastest => "ultrafast",
                EncodingSpeed::Balanced => "veryfast",
                EncodingSpeed::Compact => "medium"
            };

            let crf = match settings.quality {
                EncodingQuality::High => "18",
                EncodingQuality::Standard => "23",
                EncodingQuality::Low => "28"
            };

            vec!["-c:v", "libx264", "-pix_fmt", "yuv420p",
                "-preset", preset, "-crf", crf, "-tune", "zerolatency"]
        },

        EncoderPreset::Nvidia => {
            let preset = match settings.speed {
                EncodingSpeed::Fastest => "p1",
                EncodingSpeed::Balanced => "p4",
                EncodingSpeed::Compact => "p7"
            };

            let cq = match settings.quality {
                EncodingQuality::High => "19",
                EncodingQuality::Standard => "23",
                EncodingQuality::Low => "28"
            };

            vec!["-c:v", "h264_nvenc", "-pix_fmt", "yuv420p",
                "-preset", preset, "-rc:v", "vbr", "-cq", cq]
        },

        EncoderPreset::Amd => vec!["-c:v", "h264_amf", "-usage", "transcoding"],
        EncoderPreset::Intel => vec!["-c:v", "h264_qsv", "-preset", "medium"]
    };

    args.extend(enc_args.into_iter().map(String::from));
    args.push("-y".into());
    args.push(filename.to_string_lossy().into_owned());
    args
}

/// Arguments that mux an encoded video with a recorded WAV track.
pub fn build_merge_cmd(video: &Path, audio: &Path, output: &Path) -> Vec<String> {
    vec![
        "-i".into(), video.to_string_lossy().into_owned(),
        "-i".into(), audio.to_string_lossy().into_owned(),
        "-c:v".into(), "copy".into(),
        "-c:a".into(), "aac".into(),
        "-shortest".into(),
        "-y".into(), output.to_string_lossy().into_owned()
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter().position(|a| a == flag).and_then(|i| args.get(i + 1)).map(String::as_str)
    }

    #[test]
    fn raw_input_describes_frame_geometry() {
        let args = build_cmd(1280, 720, 30, EncoderSettings::default(), &PathBuf::from("out.mp4"));
        assert_eq!(value_after(&args, "-video_size"), Some("1280x720"));
        assert_eq!(value_after(&args, "-pixel_format"), Some("rgb24"));
        assert_eq!(value_after(&args, "-framerate"), Some("30"));
        assert_eq!(args.last().map(String::as_str), Some("out.mp4"));
    }

    #[test]
    fn cpu_preset_maps_quality_and_speed() {
        let settings = EncoderSettings {
            encoder: EncoderPreset::Cpu,
            quality: EncodingQuality::High,
            speed: EncodingSpeed::Fastest
        };
        let args = build_cmd(640, 480, 25, settings, &PathBuf::from("a.mp4"));
        assert_eq!(value_after(&args, "-c:v"), Some("libx264"));
        assert_eq!(value_after(&args, "-crf"), Some("18"));
        assert_eq!(value_after(&args, "-preset"), Some("ultrafast"));
    }

    #[test]
    fn zero_fps_is_clamped() {
        let args = build_cmd(640, 480, 0, EncoderSettings::default(), &PathBuf::from("a.mp4"));
        assert_eq!(value_after(&args, "-framerate"), Some("1"));
    }

    #[test]
    fn merge_copies_video_and_encodes_audio() {
        let args = build_merge_cmd(&PathBuf::from("v.mp4"), &PathBuf::from("a.wav"), &PathBuf::from("o.mp4"));
        assert_eq!(value_after(&args, "-c:v"), Some("copy"));
        assert_eq!(value_after(&args, "-c:a"), Some("aac"));
        assert_eq!(args.last().map(String::as_str), Some("o.mp4"));
    }
}
