use crate::messages::camera::StreamFormat;
use crate::recorder::types::EncoderSettings;
use std::{path::PathBuf, sync::Arc};

pub enum RecorderCommand {
    Configure(StreamFormat),
    Start { output: PathBuf, settings: EncoderSettings, with_audio: bool },
    WriteFrame(Arc<Vec<u8>>),
    Pause,
    Resume,
    Stop
}

pub enum RecorderStatus {
    Started(PathBuf),
    Saved(PathBuf),
    Error(String)
}
