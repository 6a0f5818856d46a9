use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use crate::preview::PreviewFrame;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FrameCacheKey {
    path: PathBuf,
    index: u64,
}

/// LRU cache for decoded frames keyed by video path and frame index.
///
/// # Example
/// ```
/// use std::sync::Arc;
///
/// use engine::PreviewFrame;
/// use engine::cache::PreviewFrameCache;
///
/// let mut cache = PreviewFrameCache::new(8);
/// cache.insert(
///     "demo.mp4",
///     PreviewFrame {
///         index: 12,
///         width: 2,
///         height: 2,
///         bytes: Arc::from(vec![0; 16]),
///     },
/// );
///
/// assert!(cache.get("demo.mp4", 12).is_some());
/// assert!(cache.get("demo.mp4", 13).is_none());
/// ```
#[derive(Debug)]
pub struct PreviewFrameCache {
    capacity: usize,
    entries: HashMap<FrameCacheKey, PreviewFrame>,
    lru_order: VecDeque<FrameCacheKey>,
}

impl PreviewFrameCache {
    /// Creates a frame cache. A zero capacity is raised to one entry.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            lru_order: VecDeque::new(),
        }
    }

    /// Clears all cached frames.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru_order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns one cached frame and marks it as recently used.
    pub fn get(&mut self, path: impl AsRef<Path>, index: u64) -> Option<PreviewFrame> {
        let key = make_key(path.as_ref(), index);
        let frame = self.entries.get(&key)?.clone();
        self.touch(&key);
        Some(frame)
    }

    /// Inserts or updates one cached frame under its own index.
    pub fn insert(&mut self, path: impl AsRef<Path>, frame: PreviewFrame) {
        let key = make_key(path.as_ref(), frame.index);
        self.entries.insert(key.clone(), frame);
        self.touch(&key);
        self.evict_if_needed();
    }

    fn touch(&mut self, key: &FrameCacheKey) {
        if let Some(position) = self.lru_order.iter().position(|existing| existing == key) {
            let _ = self.lru_order.remove(position);
        }
        self.lru_order.push_back(key.clone());
    }

    fn evict_if_needed(&mut self) {
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.lru_order.pop_front() else {
                break;
            };
            let _ = self.entries.remove(&oldest);
        }
    }
}

fn make_key(path: &Path, index: u64) -> FrameCacheKey {
    FrameCacheKey {
        path: path.to_path_buf(),
        index,
    }
}
