use std::fmt::{Display, Formatter};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use engine::{Command, Engine, EngineErrorEvent, Event, FrameSource, SceneSink};
use tracing::{debug, info, warn};

const HELP: &str = "\
commands:
  load PATH          open a video (exports the current scenes first)
  < << <<<           step back 1, 10 or 100 frames
  > >> >>>           step forward 1, 10 or 100 frames
  +N / -N | step N   step by N frames
  goto N             jump to frame number N (1-based)
  start | s          mark scene start
  end | e            mark scene end at the current frame
  export | x         write the scene file now
  resume             restore the stored scene file of this video
  status             show the timeline
  help | ?           show this text
  quit | q           export and exit";

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Engine(Command),
    Goto { frame_number: u64 },
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    UnknownCommand(String),
    MissingArgument(&'static str),
    InvalidNumber(String),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownCommand(word) => {
                write!(f, "unknown command `{word}` (type `help` for a list)")
            }
            Self::MissingArgument(what) => write!(f, "missing argument: {what}"),
            Self::InvalidNumber(value) => write!(f, "not a number: `{value}`"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses one console line; blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Input>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let input = match word {
        "load" | "open" => {
            if rest.is_empty() {
                return Err(ParseError::MissingArgument("video path"));
            }
            Input::Engine(Command::Load {
                path: PathBuf::from(rest),
            })
        }
        "<" => step(-1),
        "<<" => step(-10),
        "<<<" => step(-100),
        ">" => step(1),
        ">>" => step(10),
        ">>>" => step(100),
        "step" => step(parse_number::<i64>(rest, "step")?),
        "goto" => Input::Goto {
            frame_number: parse_number(rest, "frame number")?,
        },
        "start" | "s" => Input::Engine(Command::MarkStart),
        "end" | "e" => Input::Engine(Command::MarkEnd),
        "export" | "x" => Input::Engine(Command::Export),
        "resume" => Input::Engine(Command::Resume),
        "status" => Input::Status,
        "help" | "?" => Input::Help,
        "quit" | "q" | "exit" => Input::Quit,
        signed if signed.starts_with(['+', '-']) && rest.is_empty() => {
            let value = signed.trim_start_matches('+');
            step(
                value
                    .parse()
                    .map_err(|_| ParseError::InvalidNumber(signed.to_owned()))?,
            )
        }
        other => return Err(ParseError::UnknownCommand(other.to_owned())),
    };
    Ok(Some(input))
}

fn step(step: i64) -> Input {
    Input::Engine(Command::Navigate { step })
}

fn parse_number<T: std::str::FromStr>(value: &str, what: &'static str) -> Result<T, ParseError> {
    if value.is_empty() {
        return Err(ParseError::MissingArgument(what));
    }
    value
        .parse()
        .map_err(|_| ParseError::InvalidNumber(value.to_owned()))
}

/// Renders one engine event as a console line.
pub fn render_event(event: &Event) -> String {
    match event {
        Event::TimelineChanged(snapshot) => {
            let open = snapshot
                .scenes
                .last()
                .filter(|scene| scene.is_open())
                .map_or(String::new(), |scene| {
                    format!(", scene {} open", scene.id)
                });
            format!(
                "{}: {} frames, {} scene(s){open}",
                snapshot.video_path.display(),
                snapshot.total_frames,
                snapshot.scenes.len()
            )
        }
        Event::PlayheadChanged {
            index,
            frame_number,
        } => format!("frame {frame_number} (index {index})"),
        Event::ThumbnailStripChanged(strip) => {
            let range = strip.indices();
            match strip.highlighted_index() {
                Some(highlight) => format!(
                    "thumbnails {}..{} [highlight {highlight}]",
                    range.start, range.end
                ),
                None => format!("thumbnails {}..{}", range.start, range.end),
            }
        }
        Event::PreviewFrameReady(frame) => format!(
            "preview index {} ({}x{})",
            frame.index, frame.width, frame.height
        ),
        Event::SceneStarted {
            scene_id,
            start_frame,
        } => format!("scene {scene_id} starts at frame {start_frame}"),
        Event::SceneEnded {
            scene_id,
            end_frame,
        } => format!("scene {scene_id} ends at frame {end_frame}"),
        Event::Exported { path, scene_count } => {
            format!("exported {scene_count} scene(s) to {}", path.display())
        }
        Event::Error(error) => format!("error: {}", error.message),
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConsoleOptions {
    pub initial_video: Option<PathBuf>,
    pub resume_after_load: bool,
}

/// Reads commands from `input` until `quit` or end of input, then runs the
/// exit-time export.
///
/// The export runs even when reading input or writing output failed; that
/// failure is returned afterwards.
pub fn run<F, S, R, W>(
    mut engine: Engine<F, S>,
    options: ConsoleOptions,
    input: R,
    output: &mut W,
) -> anyhow::Result<()>
where
    F: FrameSource,
    S: SceneSink,
    R: BufRead,
    W: Write,
{
    let outcome = read_commands(&mut engine, &options, input, output);
    if let Err(error) = &outcome {
        warn!(?error, "console loop stopped early");
    }

    info!("console closed, exporting scenes");
    let reported = engine
        .shutdown()
        .iter()
        .try_for_each(|event| writeln!(output, "{}", render_event(event)))
        .context("write to console");
    outcome.and(reported)
}

fn read_commands<F, S, R, W>(
    engine: &mut Engine<F, S>,
    options: &ConsoleOptions,
    mut input: R,
    output: &mut W,
) -> anyhow::Result<()>
where
    F: FrameSource,
    S: SceneSink,
    R: BufRead,
    W: Write,
{
    writeln!(output, "type `help` for commands").context("write to console")?;

    if let Some(path) = options.initial_video.clone() {
        dispatch(engine, options, Command::Load { path }, output)?;
    }

    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        let read = input
            .read_until(b'\n', &mut buffer)
            .context("read console input")?;
        if read == 0 {
            return Ok(());
        }
        // Invalid UTF-8 is replaced so a mistyped line cannot end the session.
        let line = String::from_utf8_lossy(&buffer);
        let parsed = match parse_line(&line) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => continue,
            Err(error) => {
                writeln!(output, "{error}").context("write to console")?;
                continue;
            }
        };
        debug!(?parsed, "console input");

        match parsed {
            Input::Engine(command) => dispatch(engine, options, command, output)?,
            Input::Goto { frame_number } => {
                let current = engine
                    .snapshot()
                    .map_or(0, |snapshot| snapshot.current_frame_index);
                let target = i128::from(frame_number.max(1) - 1);
                let step = (target - i128::from(current))
                    .clamp(i128::from(i64::MIN), i128::from(i64::MAX))
                    as i64;
                dispatch(engine, options, Command::Navigate { step }, output)?;
            }
            Input::Status => write_status(engine, output)?,
            Input::Help => writeln!(output, "{HELP}").context("write to console")?,
            Input::Quit => return Ok(()),
        }
    }
}

fn write_status<F, S, W>(engine: &Engine<F, S>, output: &mut W) -> anyhow::Result<()>
where
    F: FrameSource,
    S: SceneSink,
    W: Write,
{
    let Some(snapshot) = engine.snapshot() else {
        writeln!(output, "no video loaded").context("write to console")?;
        return Ok(());
    };
    writeln!(
        output,
        "{}",
        render_event(&Event::TimelineChanged(snapshot.clone()))
    )
    .context("write to console")?;
    writeln!(
        output,
        "current frame {} / {}",
        snapshot.current_frame_number, snapshot.total_frames
    )
    .context("write to console")?;
    for scene in &snapshot.scenes {
        let end = scene
            .end_frame
            .map_or_else(|| "open".to_owned(), |end| end.to_string());
        writeln!(output, "  #{} {} - {end}", scene.id, scene.start_frame)
            .context("write to console")?;
    }
    Ok(())
}

fn dispatch<F, S, W>(
    engine: &mut Engine<F, S>,
    options: &ConsoleOptions,
    command: Command,
    output: &mut W,
) -> anyhow::Result<()>
where
    F: FrameSource,
    S: SceneSink,
    W: Write,
{
    let is_load = matches!(command, Command::Load { .. });
    if is_load && has_scenes(engine) {
        apply(engine, Command::Export, output)?;
    }

    let loaded = apply(engine, command, output)?;
    if is_load && loaded && options.resume_after_load {
        apply(engine, Command::Resume, output)?;
    }
    Ok(())
}

fn has_scenes<F, S>(engine: &Engine<F, S>) -> bool
where
    F: FrameSource,
    S: SceneSink,
{
    engine
        .snapshot()
        .is_some_and(|snapshot| !snapshot.scenes.is_empty())
}

/// Runs one command and prints its events; returns whether it succeeded.
fn apply<F, S, W>(engine: &mut Engine<F, S>, command: Command, output: &mut W) -> anyhow::Result<bool>
where
    F: FrameSource,
    S: SceneSink,
    W: Write,
{
    let (events, ok) = match engine.handle_command(command) {
        Ok(events) => (events, true),
        Err(error) => (vec![Event::Error(EngineErrorEvent::from_error(&error))], false),
    };
    for event in &events {
        writeln!(output, "{}", render_event(event)).context("write to console")?;
    }
    Ok(ok)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use engine::{
        Command, Engine, EngineConfig, EngineError, JsonDirSink, PreviewFrame, Scene,
        read_scene_document,
    };

    use super::{ConsoleOptions, HELP, Input, ParseError, parse_line, run};

    #[test]
    fn parses_navigation_shorthands() {
        assert_eq!(
            parse_line(">>").expect("parse"),
            Some(Input::Engine(Command::Navigate { step: 10 }))
        );
        assert_eq!(
            parse_line("<<<").expect("parse"),
            Some(Input::Engine(Command::Navigate { step: -100 }))
        );
        assert_eq!(
            parse_line("+25").expect("parse"),
            Some(Input::Engine(Command::Navigate { step: 25 }))
        );
        assert_eq!(
            parse_line("-7").expect("parse"),
            Some(Input::Engine(Command::Navigate { step: -7 }))
        );
        assert_eq!(
            parse_line("goto 42").expect("parse"),
            Some(Input::Goto { frame_number: 42 })
        );
    }

    #[test]
    fn load_keeps_spaces_in_path() {
        assert_eq!(
            parse_line("load  my clips/match 01.mp4 ").expect("parse"),
            Some(Input::Engine(Command::Load {
                path: PathBuf::from("my clips/match 01.mp4")
            }))
        );
    }

    #[test]
    fn reports_malformed_lines() {
        assert_eq!(parse_line("   ").expect("parse"), None);
        assert_eq!(
            parse_line("jump"),
            Err(ParseError::UnknownCommand("jump".to_owned()))
        );
        assert_eq!(
            parse_line("goto"),
            Err(ParseError::MissingArgument("frame number"))
        );
        assert_eq!(
            parse_line("+ten"),
            Err(ParseError::InvalidNumber("+ten".to_owned()))
        );
    }

    #[test]
    fn session_exports_before_switching_video_and_on_quit() {
        let root = tempfile::tempdir().expect("temp dir");
        let jsons = root.path().join("jsons");
        let engine = Engine::new(
            StubFrames { total_frames: 50 },
            JsonDirSink::new(&jsons),
            EngineConfig::default(),
        );
        let script = "start\n+25\nend\ngoto 40\nstart\nload second.mp4\nstart\nquit\nstart\n";
        let mut output = Vec::new();

        run(
            engine,
            ConsoleOptions {
                initial_video: Some(PathBuf::from("first.mp4")),
                resume_after_load: false,
            },
            Cursor::new(script),
            &mut output,
        )
        .expect("console should run");

        let first = read_scene_document(&jsons.join("first.json")).expect("first scenes");
        assert_eq!(
            first.scenes,
            vec![
                Scene {
                    id: 1,
                    start_frame: 1,
                    end_frame: Some(26)
                },
                Scene {
                    id: 2,
                    start_frame: 27,
                    end_frame: None
                },
            ]
        );
        let second = read_scene_document(&jsons.join("second.json")).expect("second scenes");
        assert_eq!(second.scenes.len(), 1);

        let text = String::from_utf8(output).expect("utf8 output");
        assert!(text.contains("frame 40 (index 39)"));
        assert!(text.contains("scene 1 ends at frame 26"));
    }

    #[test]
    fn resume_flag_restores_scenes_after_load() {
        let root = tempfile::tempdir().expect("temp dir");
        let sink = JsonDirSink::new(root.path());
        let mut output = Vec::new();
        run(
            Engine::new(StubFrames { total_frames: 50 }, sink.clone(), EngineConfig::default()),
            ConsoleOptions {
                initial_video: Some(PathBuf::from("clip.mp4")),
                resume_after_load: false,
            },
            Cursor::new("start\n+9\nend\n"),
            &mut output,
        )
        .expect("first run");

        let mut output = Vec::new();
        run(
            Engine::new(StubFrames { total_frames: 50 }, sink.clone(), EngineConfig::default()),
            ConsoleOptions {
                initial_video: Some(PathBuf::from("clip.mp4")),
                resume_after_load: true,
            },
            Cursor::new("start\nstatus\n"),
            &mut output,
        )
        .expect("second run");

        let text = String::from_utf8(output).expect("utf8 output");
        assert!(text.contains("scene 2 starts at frame 11"));
        let stored =
            read_scene_document(&root.path().join("clip.json")).expect("stored scenes");
        assert_eq!(stored.scenes.len(), 2);
    }

    #[test]
    fn invalid_utf8_line_does_not_end_session() {
        let root = tempfile::tempdir().expect("temp dir");
        let mut script = b"start\n+9\nend\nload ".to_vec();
        script.extend_from_slice(&[0xff, 0xfe]);
        script.extend_from_slice(b".mp4\nquit\n");
        let mut output = Vec::new();

        run(
            Engine::new(
                StubFrames { total_frames: 50 },
                JsonDirSink::new(root.path()),
                EngineConfig::default(),
            ),
            ConsoleOptions {
                initial_video: Some(PathBuf::from("clip.mp4")),
                resume_after_load: false,
            },
            Cursor::new(script),
            &mut output,
        )
        .expect("console should run");

        let stored = read_scene_document(&root.path().join("clip.json")).expect("stored scenes");
        assert_eq!(
            stored.scenes,
            vec![Scene {
                id: 1,
                start_frame: 1,
                end_frame: Some(10)
            }]
        );
    }

    #[test]
    fn output_failure_still_exports_before_returning_error() {
        let root = tempfile::tempdir().expect("temp dir");
        let sink = JsonDirSink::new(root.path());
        let mut engine = Engine::new(
            StubFrames { total_frames: 50 },
            sink.clone(),
            EngineConfig::default(),
        );
        for command in [
            Command::Load {
                path: PathBuf::from("clip.mp4"),
            },
            Command::MarkStart,
        ] {
            engine
                .handle_command(command)
                .expect("command should succeed");
        }

        let result = run(
            engine,
            ConsoleOptions::default(),
            Cursor::new("status\n"),
            &mut FailingWriter,
        );

        assert!(result.is_err());
        let stored = read_scene_document(&root.path().join("clip.json")).expect("stored scenes");
        assert_eq!(stored.scenes.len(), 1);
    }

    #[test]
    fn help_lists_every_step_form() {
        assert!(HELP.contains("step N"));
        assert_eq!(
            parse_line("step -3").expect("parse"),
            Some(Input::Engine(Command::Navigate { step: -3 }))
        );
    }

    #[test]
    fn commands_without_video_print_errors_and_continue() {
        let root = tempfile::tempdir().expect("temp dir");
        let mut output = Vec::new();

        run(
            Engine::new(
                StubFrames { total_frames: 50 },
                JsonDirSink::new(root.path()),
                EngineConfig::default(),
            ),
            ConsoleOptions::default(),
            Cursor::new("start\nbogus\nstatus\n"),
            &mut output,
        )
        .expect("console should run");

        let text = String::from_utf8(output).expect("utf8 output");
        assert!(text.contains("error: no video is loaded"));
        assert!(text.contains("unknown command `bogus`"));
        assert!(text.contains("\nno video loaded\n"));
        assert!(text.contains("error: no scenes to export"));
    }

    struct FailingWriter;

    impl std::io::Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "console closed",
            ))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[derive(Debug)]
    struct StubFrames {
        total_frames: u64,
    }

    impl engine::FrameSource for StubFrames {
        fn frame_count(&self, _path: &Path) -> engine::Result<u64> {
            Ok(self.total_frames)
        }

        fn decode_frame(&self, _path: &Path, index: u64) -> engine::Result<PreviewFrame> {
            if index >= self.total_frames {
                return Err(EngineError::OutOfRange {
                    frame: index + 1,
                    total_frames: self.total_frames,
                });
            }
            Ok(PreviewFrame {
                index,
                width: 1,
                height: 1,
                bytes: Arc::from(vec![0; 4]),
            })
        }
    }
}
