use std::path::Path;
use std::process::Command;

use crate::error::{MediaFfmpegError, Result};
use crate::probe::probe_media;

/// A decoded video frame in RGBA format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedVideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub index: u64,
}

/// Decodes the video frame at 0-based decode-order position `index`.
///
/// Frames are counted by the `select` filter's `n` variable, which matches
/// the frame numbering used by `nb_frames`.
///
/// # Example
/// ```no_run
/// use media_ffmpeg::decode_video_frame_at_index;
///
/// let frame = decode_video_frame_at_index("sample.mp4", 12)
///     .expect("decode should succeed");
/// assert_eq!(frame.index, 12);
/// ```
pub fn decode_video_frame_at_index(path: impl AsRef<Path>, index: u64) -> Result<DecodedVideoFrame> {
    let path = path.as_ref();
    let media = probe_media(path)?;
    let video = media
        .first_video()
        .ok_or_else(|| MediaFfmpegError::MissingVideoStream(path.to_path_buf()))?;
    let width = video
        .width
        .ok_or_else(|| MediaFfmpegError::MissingVideoDimensions(path.to_path_buf()))?;
    let height = video
        .height
        .ok_or_else(|| MediaFfmpegError::MissingVideoDimensions(path.to_path_buf()))?;

    let rgba = decode_rgba_frame_at_index(path, index)?;
    if rgba.is_empty() {
        return Err(MediaFfmpegError::FrameNotDecoded {
            path: path.to_path_buf(),
            index,
        });
    }

    let expected_size = width as usize * height as usize * 4;
    if rgba.len() != expected_size {
        return Err(MediaFfmpegError::Parse {
            context: "decoded rgba size",
            value: format!("expected {expected_size} bytes, got {}", rgba.len()),
        });
    }

    Ok(DecodedVideoFrame {
        width,
        height,
        rgba,
        index,
    })
}

fn decode_rgba_frame_at_index(path: &Path, index: u64) -> Result<Vec<u8>> {
    let filter = select_frame_filter(index);
    let output = Command::new("ffmpeg")
        .arg("-hide_banner")
        .arg("-v")
        .arg("error")
        .arg("-i")
        .arg(path)
        .arg("-vf")
        .arg(&filter)
        .arg("-frames:v")
        .arg("1")
        .arg("-f")
        .arg("rawvideo")
        .arg("-pix_fmt")
        .arg("rgba")
        .arg("-")
        .output()
        .map_err(|source| MediaFfmpegError::Io {
            context: "run ffmpeg decode frame",
            source,
        })?;

    if !output.status.success() {
        return Err(MediaFfmpegError::CommandFailed {
            command: format!("ffmpeg decode frame {index} {}", path.display()),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    Ok(output.stdout)
}

fn select_frame_filter(index: u64) -> String {
    format!("select=eq(n\\,{index}),format=rgba")
}

#[cfg(test)]
mod tests {
    use super::select_frame_filter;

    #[test]
    fn select_filter_escapes_argument_separator() {
        assert_eq!(select_frame_filter(42), "select=eq(n\\,42),format=rgba");
    }
}
