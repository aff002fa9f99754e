use std::{fmt, sync::Arc};

#[derive(Debug, Clone, PartialEq)]
pub struct CameraDevice {
    pub name: String,
    pub index: u32
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamFormat {
    pub width: u32,
    pub height: u32,
    pub fps: u32
}

impl fmt::Display for StreamFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}@{}fps", self.width, self.height, self.fps)
    }
}

pub enum CameraMessage {
    StreamStarted(StreamFormat),
    Frame {
        rgb: Arc<Vec<u8>>,
        width: u32,
        height: u32
    },
    Photo(image::RgbImage),
    Error(String)
}

pub enum CameraCommand {
    Open,
    Close,
    Capture,
    /// Start or stop handing frames to the video recorder.
    Forward(bool),
    Shutdown
}
