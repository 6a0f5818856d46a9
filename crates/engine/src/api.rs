use std::path::{Path, PathBuf};

use crate::cache::PreviewFrameCache;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::export::{JsonDirSink, SceneSink};
use crate::preview::{FfmpegFrameSource, FrameSource, PreviewFrame};
use crate::session::Session;
use crate::thumbnails::ThumbnailStrip;
use crate::timeline::{Scene, SceneId};
use tracing::{debug, info, warn};

/// Commands accepted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Opens a video and starts a fresh annotation session.
    ///
    /// Fails, leaving no video loaded, when the frame count cannot be
    /// probed or the first frame cannot be decoded.
    ///
    /// # Example
    /// ```no_run
    /// use std::path::PathBuf;
    /// use engine::{Command, Engine, EngineConfig, JsonDirSink};
    ///
    /// let mut engine = Engine::with_ffmpeg(JsonDirSink::new("jsons"), EngineConfig::default());
    /// let _ = engine.handle_command(Command::Load {
    ///     path: PathBuf::from("match_01.mp4"),
    /// });
    /// ```
    Load {
        path: PathBuf,
    },
    /// Moves the playhead by `step` frames, clamped to the video.
    Navigate {
        step: i64,
    },
    MarkStart,
    MarkEnd,
    /// Writes the recorded scenes through the scene sink.
    Export,
    /// Replaces the recorded scenes with the sink's stored document for the
    /// loaded video, if any.
    Resume,
}

/// Events emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    TimelineChanged(TimelineSnapshot),
    PlayheadChanged { index: u64, frame_number: u64 },
    ThumbnailStripChanged(ThumbnailStrip),
    PreviewFrameReady(PreviewFrame),
    SceneStarted { scene_id: SceneId, start_frame: u64 },
    SceneEnded { scene_id: SceneId, end_frame: u64 },
    Exported { path: PathBuf, scene_count: usize },
    Error(EngineErrorEvent),
}

/// Error category surfaced to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    VideoNotLoaded,
    OutOfRange,
    NoOpenScene,
    InvalidOrder,
    SceneAlreadyOpen,
    SceneAlreadyClosed,
    NothingToExport,
    Other,
}

impl From<&EngineError> for EngineErrorKind {
    fn from(value: &EngineError) -> Self {
        match value {
            EngineError::VideoNotLoaded => Self::VideoNotLoaded,
            EngineError::OutOfRange { .. } => Self::OutOfRange,
            EngineError::NoOpenScene => Self::NoOpenScene,
            EngineError::InvalidOrder { .. } => Self::InvalidOrder,
            EngineError::SceneAlreadyOpen { .. } => Self::SceneAlreadyOpen,
            EngineError::SceneAlreadyClosed { .. } => Self::SceneAlreadyClosed,
            EngineError::NothingToExport => Self::NothingToExport,
            _ => Self::Other,
        }
    }
}

/// User-facing error payload emitted as an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineErrorEvent {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineErrorEvent {
    pub fn from_error(error: &EngineError) -> Self {
        Self {
            kind: EngineErrorKind::from(error),
            message: error.to_string(),
        }
    }
}

/// Immutable timeline snapshot consumed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineSnapshot {
    pub video_path: PathBuf,
    pub total_frames: u64,
    pub current_frame_index: u64,
    pub current_frame_number: u64,
    pub scenes: Vec<Scene>,
}

/// Engine implementation for load/navigate/mark/export commands.
///
/// The engine is single-threaded; callers sharing it across threads must
/// serialize access to it.
#[derive(Debug)]
pub struct Engine<F, S> {
    frames: F,
    sink: S,
    config: EngineConfig,
    session: Option<Session>,
    preview_cache: PreviewFrameCache,
}

impl<F, S> Engine<F, S>
where
    F: FrameSource,
    S: SceneSink,
{
    /// Creates a new engine with the provided frame source and scene sink.
    pub fn new(frames: F, sink: S, config: EngineConfig) -> Self {
        Self {
            frames,
            sink,
            config,
            session: None,
            preview_cache: PreviewFrameCache::new(config.preview_cache_capacity),
        }
    }

    /// Applies one command and returns emitted events.
    pub fn handle_command(&mut self, command: Command) -> Result<Vec<Event>> {
        match command {
            Command::Load { path } => self.load(path),
            Command::Navigate { step } => self.navigate(step),
            Command::MarkStart => self.mark_start(),
            Command::MarkEnd => self.mark_end(),
            Command::Export => self.export(),
            Command::Resume => self.resume(),
        }
    }

    /// Returns the current timeline snapshot, if a video is loaded.
    pub fn snapshot(&self) -> Option<TimelineSnapshot> {
        self.session.as_ref().map(Session::snapshot)
    }

    /// Decodes one frame of the loaded video, using the frame cache.
    pub fn frame_at(&mut self, index: u64) -> Result<PreviewFrame> {
        let session = self.session.as_ref().ok_or(EngineError::VideoNotLoaded)?;
        let total_frames = session.timeline.total_frames();
        if index >= total_frames {
            return Err(EngineError::OutOfRange {
                frame: index + 1,
                total_frames,
            });
        }
        let path = session.video_path.clone();
        self.decode_frame_cached(&path, index)
    }

    /// Runs the exit-time export and consumes the engine.
    ///
    /// Failures, including an empty scene list, are reported as events.
    pub fn shutdown(mut self) -> Vec<Event> {
        match self.export() {
            Ok(events) => events,
            Err(error) => {
                warn!(%error, "export on shutdown skipped");
                vec![Event::Error(EngineErrorEvent::from_error(&error))]
            }
        }
    }

    fn load(&mut self, path: PathBuf) -> Result<Vec<Event>> {
        self.session = None;
        self.preview_cache.clear();

        let total_frames = self.frames.frame_count(&path)?;
        let first_frame = if total_frames > 0 {
            Some(self.frames.decode_frame(&path, 0)?)
        } else {
            None
        };

        let session = Session::open(path, total_frames, self.config.marks);
        let mut events = vec![
            Event::TimelineChanged(session.snapshot()),
            Event::PlayheadChanged {
                index: 0,
                frame_number: 1,
            },
            Event::ThumbnailStripChanged(session.thumbnail_strip()),
        ];
        if let Some(frame) = first_frame {
            self.preview_cache.insert(&session.video_path, frame.clone());
            events.push(Event::PreviewFrameReady(frame));
        }

        info!(path = ?session.video_path, total_frames, "video loaded");
        self.session = Some(session);
        Ok(events)
    }

    fn navigate(&mut self, step: i64) -> Result<Vec<Event>> {
        let session = self.session.as_mut().ok_or(EngineError::VideoNotLoaded)?;
        let index = session.timeline.navigate(step);
        let frame_number = session.timeline.current_frame_number();
        let total_frames = session.timeline.total_frames();
        let strip = session.thumbnail_strip();
        let path = session.video_path.clone();

        debug!(step, index, "playhead moved");
        let mut events = vec![
            Event::PlayheadChanged {
                index,
                frame_number,
            },
            Event::ThumbnailStripChanged(strip),
        ];

        if self.config.decode_previews && total_frames > 0 {
            match self.decode_frame_cached(&path, index) {
                Ok(frame) => events.push(Event::PreviewFrameReady(frame)),
                Err(error) => {
                    warn!(index, %error, "preview decode failed");
                    events.push(Event::Error(EngineErrorEvent::from_error(&error)));
                }
            }
        }

        Ok(events)
    }

    fn mark_start(&mut self) -> Result<Vec<Event>> {
        let session = self.session.as_mut().ok_or(EngineError::VideoNotLoaded)?;
        let start_frame = session.timeline.mark_start()?;
        let scene_id = last_scene_id(session)?;

        info!(scene_id, start_frame, "scene started");
        Ok(vec![
            Event::SceneStarted {
                scene_id,
                start_frame,
            },
            Event::TimelineChanged(session.snapshot()),
        ])
    }

    fn mark_end(&mut self) -> Result<Vec<Event>> {
        let session = self.session.as_mut().ok_or(EngineError::VideoNotLoaded)?;
        let end_frame = session.timeline.mark_end()?;
        let scene_id = last_scene_id(session)?;

        info!(scene_id, end_frame, "scene ended");
        Ok(vec![
            Event::SceneEnded {
                scene_id,
                end_frame,
            },
            Event::TimelineChanged(session.snapshot()),
        ])
    }

    fn export(&mut self) -> Result<Vec<Event>> {
        // Without a video there are no scenes either.
        let session = self.session.as_ref().ok_or(EngineError::NothingToExport)?;
        let document = session.scene_document()?;
        let path = self.sink.write(&session.video_path, &document)?;

        Ok(vec![Event::Exported {
            path,
            scene_count: document.scenes.len(),
        }])
    }

    fn resume(&mut self) -> Result<Vec<Event>> {
        let session = self.session.as_mut().ok_or(EngineError::VideoNotLoaded)?;
        let Some(document) = self.sink.read(&session.video_path)? else {
            info!(path = ?session.video_path, "no stored scenes to resume");
            return Ok(Vec::new());
        };

        let scene_count = document.scenes.len();
        session.timeline.restore(document.scenes)?;
        info!(path = ?session.video_path, scene_count, "scenes resumed");
        Ok(vec![Event::TimelineChanged(session.snapshot())])
    }

    fn decode_frame_cached(&mut self, path: &Path, index: u64) -> Result<PreviewFrame> {
        if let Some(frame) = self.preview_cache.get(path, index) {
            debug!(index, path = ?path, "preview cache hit");
            return Ok(frame);
        }

        debug!(index, path = ?path, "preview cache miss");
        let frame = self.frames.decode_frame(path, index)?;
        self.preview_cache.insert(path, frame.clone());
        Ok(frame)
    }
}

fn last_scene_id(session: &Session) -> Result<SceneId> {
    session
        .timeline
        .scenes()
        .last()
        .map(|scene| scene.id)
        .ok_or(EngineError::NoOpenScene)
}

impl Engine<FfmpegFrameSource, JsonDirSink> {
    /// Creates an engine wired to the FFmpeg frame source.
    pub fn with_ffmpeg(sink: JsonDirSink, config: EngineConfig) -> Self {
        Self::new(FfmpegFrameSource, sink, config)
    }
}
