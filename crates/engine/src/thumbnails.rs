use std::ops::Range;

/// Number of thumbnails shown after the playhead, including it.
pub const THUMBNAIL_WINDOW_LEN: u64 = 10;
/// Slot within the visible window drawn with a highlight border.
pub const HIGHLIGHT_SLOT: u64 = 3;

/// Frame indices of the thumbnail strip shown under the main preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailStrip {
    pub first_index: u64,
    pub len: u64,
}

impl ThumbnailStrip {
    /// Builds the strip starting at the playhead, clamped to the video end.
    ///
    /// # Example
    /// ```
    /// use engine::ThumbnailStrip;
    ///
    /// let strip = ThumbnailStrip::at(95, 100);
    /// assert_eq!(strip.indices(), 95..100);
    /// assert_eq!(strip.highlighted_index(), Some(98));
    /// ```
    pub fn at(current_frame_index: u64, total_frames: u64) -> Self {
        let first_index = current_frame_index.min(total_frames);
        let end = first_index
            .saturating_add(THUMBNAIL_WINDOW_LEN)
            .min(total_frames);
        Self {
            first_index,
            len: end - first_index,
        }
    }

    pub fn indices(&self) -> Range<u64> {
        self.first_index..self.first_index + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Frame index of the highlighted slot, if the window reaches it.
    pub fn highlighted_index(&self) -> Option<u64> {
        (HIGHLIGHT_SLOT < self.len).then(|| self.first_index + HIGHLIGHT_SLOT)
    }
}

#[cfg(test)]
mod tests {
    use super::ThumbnailStrip;

    #[test]
    fn full_window_starts_at_playhead() {
        let strip = ThumbnailStrip::at(25, 100);

        assert_eq!(strip.indices(), 25..35);
        assert_eq!(strip.highlighted_index(), Some(28));
    }

    #[test]
    fn short_video_has_no_highlight_beyond_its_frames() {
        let strip = ThumbnailStrip::at(0, 3);

        assert_eq!(strip.indices(), 0..3);
        assert_eq!(strip.highlighted_index(), None);
    }

    #[test]
    fn empty_video_yields_empty_strip() {
        let strip = ThumbnailStrip::at(0, 0);

        assert!(strip.is_empty());
        assert_eq!(strip.highlighted_index(), None);
    }

    #[test]
    fn window_at_last_frame_holds_single_thumbnail() {
        let strip = ThumbnailStrip::at(99, 100);

        assert_eq!(strip.indices(), 99..100);
        assert_eq!(strip.highlighted_index(), None);
    }
}
