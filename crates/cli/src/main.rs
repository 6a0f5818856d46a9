mod args;
mod console;

use std::io;

use anyhow::Context;
use clap::Parser;
use engine::{Engine, JsonDirSink};
use tracing::info;
use tracing_subscriber::EnvFilter;

use args::Args;
use console::ConsoleOptions;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let sink = match &args.jsons_dir {
        Some(dir) => JsonDirSink::new(dir),
        None => JsonDirSink::next_to_executable().context("resolve scene file directory")?,
    };
    info!(dir = ?sink.dir(), "scene files directory");

    let engine = Engine::with_ffmpeg(sink, args.engine_config());
    let options = ConsoleOptions {
        initial_video: args.video.clone(),
        resume_after_load: args.resume,
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    console::run(engine, options, stdin.lock(), &mut stdout)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}
