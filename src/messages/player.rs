/// One decoded RGBA frame and its presentation time.
pub struct VideoFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub pts_ms: u64,
    /// Decode session that produced the frame; stale sessions are dropped.
    pub session: u64
}

pub enum DecoderEvent {
    Frame(VideoFrame),
    EndOfStream { session: u64 },
    Error { session: u64, message: String }
}
