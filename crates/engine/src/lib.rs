//! UI-agnostic scene annotation engine.
//!
//! The engine owns the loaded video's timeline, turns user commands into
//! events for a presentation layer and persists the recorded scenes as JSON.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod export;
pub mod preview;
pub mod session;
pub mod thumbnails;
pub mod timeline;

pub use api::{Command, Engine, EngineErrorEvent, EngineErrorKind, Event, TimelineSnapshot};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use export::{
    DEFAULT_SCENE_DIR, JsonDirSink, SceneDocument, SceneSink, read_scene_document,
    write_scene_document,
};
pub use preview::{FfmpegFrameSource, FrameSource, PreviewFrame};
pub use session::Session;
pub use thumbnails::ThumbnailStrip;
pub use timeline::{ClosedScenePolicy, MarkPolicy, OpenScenePolicy, Scene, SceneId, Timeline};
