use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

/// Decoded RGBA frame passed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewFrame {
    pub index: u64,
    pub width: u32,
    pub height: u32,
    pub bytes: Arc<[u8]>,
}

/// Frame access required by the engine.
pub trait FrameSource {
    /// Returns the number of frames in the video at `path`.
    fn frame_count(&self, path: &Path) -> Result<u64>;

    /// Decodes the frame at 0-based `index`.
    fn decode_frame(&self, path: &Path, index: u64) -> Result<PreviewFrame>;
}

/// FFmpeg CLI-backed frame source used by production wiring.
#[derive(Debug, Default, Clone, Copy)]
pub struct FfmpegFrameSource;

impl FrameSource for FfmpegFrameSource {
    fn frame_count(&self, path: &Path) -> Result<u64> {
        Ok(media_ffmpeg::probe_frame_count(path)?)
    }

    fn decode_frame(&self, path: &Path, index: u64) -> Result<PreviewFrame> {
        let decoded = media_ffmpeg::decode_video_frame_at_index(path, index)?;
        Ok(PreviewFrame {
            index: decoded.index,
            width: decoded.width,
            height: decoded.height,
            bytes: decoded.rgba.into(),
        })
    }
}
