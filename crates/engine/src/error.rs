use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use crate::timeline::SceneId;

/// Result type used by the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors produced by engine commands and timeline operations.
#[derive(Debug)]
pub enum EngineError {
    VideoNotLoaded,
    OutOfRange {
        frame: u64,
        total_frames: u64,
    },
    NoOpenScene,
    InvalidOrder {
        end_frame: u64,
        start_frame: u64,
    },
    SceneAlreadyOpen {
        scene_id: SceneId,
    },
    SceneAlreadyClosed {
        scene_id: SceneId,
        end_frame: u64,
    },
    NothingToExport,
    InvalidVideoPath(PathBuf),
    SceneFileIo {
        context: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    SceneFileSerialization {
        path: PathBuf,
        source: serde_json::Error,
    },
    InvalidSceneFile {
        reason: String,
    },
    Media(media_ffmpeg::MediaFfmpegError),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VideoNotLoaded => write!(f, "no video is loaded"),
            Self::OutOfRange {
                frame,
                total_frames,
            } => write!(
                f,
                "frame {frame} is beyond the end of the video ({total_frames} frames)"
            ),
            Self::NoOpenScene => write!(f, "no scene has been started yet"),
            Self::InvalidOrder {
                end_frame,
                start_frame,
            } => write!(
                f,
                "end frame {end_frame} must be after start frame {start_frame}"
            ),
            Self::SceneAlreadyOpen { scene_id } => {
                write!(f, "scene {scene_id} is still open")
            }
            Self::SceneAlreadyClosed {
                scene_id,
                end_frame,
            } => write!(f, "scene {scene_id} is already closed at frame {end_frame}"),
            Self::NothingToExport => write!(f, "no scenes to export"),
            Self::InvalidVideoPath(path) => {
                write!(f, "video path has no file name: {}", path.display())
            }
            Self::SceneFileIo {
                context,
                path,
                source,
            } => write!(f, "{context}: {} ({source})", path.display()),
            Self::SceneFileSerialization { path, source } => {
                write!(
                    f,
                    "scene file serialization/deserialization failed at {} ({source})",
                    path.display()
                )
            }
            Self::InvalidSceneFile { reason } => write!(f, "invalid scene file: {reason}"),
            Self::Media(err) => write!(f, "media backend error: {err}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SceneFileIo { source, .. } => Some(source),
            Self::SceneFileSerialization { source, .. } => Some(source),
            Self::Media(err) => Some(err),
            _ => None,
        }
    }
}

impl From<media_ffmpeg::MediaFfmpegError> for EngineError {
    fn from(value: media_ffmpeg::MediaFfmpegError) -> Self {
        Self::Media(value)
    }
}
