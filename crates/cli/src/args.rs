use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use engine::{ClosedScenePolicy, EngineConfig, MarkPolicy, OpenScenePolicy};

/// Mark scene boundaries in a video and export them as JSON
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Video loaded at startup
    #[arg(value_name = "VIDEO")]
    pub video: Option<PathBuf>,

    /// Directory receiving `<video-stem>.json` [default: jsons/ next to the executable]
    #[arg(long = "jsons-dir", value_name = "DIR")]
    pub jsons_dir: Option<PathBuf>,

    /// What "start" does while the last scene is still open
    #[arg(long = "on-open-start", value_enum, default_value_t = OpenStart::Append)]
    pub on_open_start: OpenStart,

    /// What "end" does when the last scene is already closed
    #[arg(long = "on-closed-end", value_enum, default_value_t = ClosedEnd::Overwrite)]
    pub on_closed_end: ClosedEnd,

    /// Skip decoding the frame under the playhead after each move
    #[arg(long = "no-preview")]
    pub no_preview: bool,

    /// Restore previously exported scenes after each load
    #[arg(long = "resume")]
    pub resume: bool,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenStart {
    Append,
    Reject,
    AutoClose,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClosedEnd {
    Overwrite,
    Reject,
}

impl Args {
    pub fn engine_config(&self) -> EngineConfig {
        let open_scene = match self.on_open_start {
            OpenStart::Append => OpenScenePolicy::Append,
            OpenStart::Reject => OpenScenePolicy::Reject,
            OpenStart::AutoClose => OpenScenePolicy::AutoClose,
        };
        let closed_scene = match self.on_closed_end {
            ClosedEnd::Overwrite => ClosedScenePolicy::Overwrite,
            ClosedEnd::Reject => ClosedScenePolicy::Reject,
        };
        EngineConfig {
            marks: MarkPolicy {
                open_scene,
                closed_scene,
            },
            decode_previews: !self.no_preview,
            ..EngineConfig::default()
        }
    }
}
