use std::path::PathBuf;

use crate::api::TimelineSnapshot;
use crate::error::Result;
use crate::export::SceneDocument;
use crate::thumbnails::ThumbnailStrip;
use crate::timeline::{MarkPolicy, Timeline};

/// Annotation state for the currently loaded video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub video_path: PathBuf,
    pub timeline: Timeline,
}

impl Session {
    /// Starts a fresh annotation session over `total_frames` frames.
    pub fn open(video_path: PathBuf, total_frames: u64, policy: MarkPolicy) -> Self {
        Self {
            video_path,
            timeline: Timeline::new(total_frames, policy),
        }
    }

    /// Creates an immutable snapshot for the presentation layer.
    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            video_path: self.video_path.clone(),
            total_frames: self.timeline.total_frames(),
            current_frame_index: self.timeline.current_frame_index(),
            current_frame_number: self.timeline.current_frame_number(),
            scenes: self.timeline.scenes().to_vec(),
        }
    }

    /// Thumbnail window starting at the playhead.
    pub fn thumbnail_strip(&self) -> ThumbnailStrip {
        ThumbnailStrip::at(
            self.timeline.current_frame_index(),
            self.timeline.total_frames(),
        )
    }

    pub fn scene_document(&self) -> Result<SceneDocument> {
        SceneDocument::from_timeline(&self.timeline)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::Session;
    use crate::timeline::MarkPolicy;

    #[test]
    fn snapshot_reports_one_based_frame_number() {
        let mut session = Session::open(PathBuf::from("demo.mp4"), 100, MarkPolicy::default());
        session.timeline.navigate(41);

        let snapshot = session.snapshot();

        assert_eq!(snapshot.current_frame_index, 41);
        assert_eq!(snapshot.current_frame_number, 42);
        assert_eq!(snapshot.total_frames, 100);
        assert!(snapshot.scenes.is_empty());
    }

    #[test]
    fn thumbnail_strip_follows_playhead() {
        let mut session = Session::open(PathBuf::from("demo.mp4"), 12, MarkPolicy::default());
        session.timeline.navigate(5);

        let strip = session.thumbnail_strip();

        assert_eq!(strip.indices(), 5..12);
        assert_eq!(strip.highlighted_index(), Some(8));
    }
}
