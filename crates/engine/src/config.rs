use crate::timeline::MarkPolicy;

pub const DEFAULT_PREVIEW_CACHE_CAPACITY: usize = 32;

/// Engine settings chosen by the presentation layer at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub marks: MarkPolicy,
    pub preview_cache_capacity: usize,
    /// Decode the frame under the playhead after every navigation.
    pub decode_previews: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            marks: MarkPolicy::default(),
            preview_cache_capacity: DEFAULT_PREVIEW_CACHE_CAPACITY,
            decode_previews: true,
        }
    }
}
