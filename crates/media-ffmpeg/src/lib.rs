mod decode;
mod error;
mod probe;
mod time;

pub use decode::{DecodedVideoFrame, decode_video_frame_at_index};
pub use error::{MediaFfmpegError, Result};
pub use probe::{MediaInfo, StreamInfo, StreamKind, probe_frame_count, probe_media};
pub use time::{Rational, frames_in_duration};
