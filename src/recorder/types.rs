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

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderPreset {
    #[default]
    Cpu,
    Nvidia,
    Amd,
    Intel
}

impl fmt::Display for EncoderPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncoderPreset::Cpu => write!(f, "CPU (libx264)"),
            EncoderPreset::Nvidia => write!(f, "NVIDIA (NVENC)"),
            EncoderPreset::Amd => write!(f, "AMD (AMF)"),
            EncoderPreset::Intel => write!(f, "Intel (QuickSync)")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingQuality {
    High,
    #[default]
    Standard,
    Low
}

impl fmt::Display for EncodingQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingQuality::High => write!(f, "HQ"),
            EncodingQuality::Standard => write!(f, "SQ"),
            EncodingQuality::Low => write!(f, "LQ")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingSpeed {
    Fastest,
    #[default]
    Balanced,
    Compact
}

impl fmt::Display for EncodingSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingSpeed::Fastest => write!(f, "Fastest"),
            EncodingSpeed::Balanced => write!(f, "Balanced"),
            EncodingSpeed::Compact => write!(f, "Compact")
        }
    }
}

/// Encoder settings handed to the recorder thread with every new recording.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EncoderSettings {
    #[serde(default)]
    pub encoder: EncoderPreset,
    #[serde(default)]
    pub quality: EncodingQuality,
    #[serde(default)]
    pub speed: EncodingSpeed
}

impl fmt::Display for EncoderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.encoder, self.quality, self.speed)
    }
}
