use crossbeam_channel::Sender;
use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct AudioDevice {
    pub name: String,
    pub index: usize
}

pub enum AudioMessage {
    RecordingSaved(PathBuf),
    Error(String)
}

pub enum AudioCommand {
    StartRecording(PathBuf),
    Pause,
    Resume,
    /// With an ack the finished path goes to the ack instead of the UI.
    StopRecording(Option<Sender<Option<PathBuf>>>)
}
