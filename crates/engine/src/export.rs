use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use tracing::{debug, info};

use crate::error::{EngineError, Result};
use crate::timeline::{Scene, Timeline};

/// Default directory name for scene files.
pub const DEFAULT_SCENE_DIR: &str = "jsons";
const SCENE_FILE_EXTENSION: &str = "json";
const JSON_INDENT: &[u8] = b"    ";

/// Serialized form of an annotated timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub scenes: Vec<Scene>,
}

impl SceneDocument {
    /// Captures the scenes of `timeline` in id order.
    ///
    /// Fails with `NothingToExport` when no scene has been recorded.
    pub fn from_timeline(timeline: &Timeline) -> Result<Self> {
        if timeline.scenes().is_empty() {
            return Err(EngineError::NothingToExport);
        }
        Ok(Self {
            scenes: timeline.scenes().to_vec(),
        })
    }

    /// Renders the document as JSON indented with four spaces.
    pub fn to_json_bytes(&self) -> std::result::Result<Vec<u8>, serde_json::Error> {
        let mut bytes = Vec::new();
        let formatter = PrettyFormatter::with_indent(JSON_INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
        self.serialize(&mut serializer)?;
        Ok(bytes)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        String::from_utf8(self.to_json_bytes()?).map_err(serde::ser::Error::custom)
    }

    pub fn from_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Destination for exported scene documents.
pub trait SceneSink {
    /// Persists `document` for the video at `video_path` and returns the
    /// written location.
    fn write(&self, video_path: &Path, document: &SceneDocument) -> Result<PathBuf>;

    /// Reads a previously persisted document, if one exists.
    fn read(&self, video_path: &Path) -> Result<Option<SceneDocument>>;
}

/// Writes `<dir>/<video-stem>.json`, creating `dir` when missing and
/// overwriting existing files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonDirSink {
    dir: PathBuf,
}

impl JsonDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Sink rooted at `jsons/` next to the running executable.
    pub fn next_to_executable() -> Result<Self> {
        let exe = std::env::current_exe().map_err(|source| EngineError::SceneFileIo {
            context: "locate running executable",
            path: PathBuf::new(),
            source,
        })?;
        let base = exe.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self::new(base.join(DEFAULT_SCENE_DIR)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the scene file location for `video_path`.
    ///
    /// # Example
    /// ```
    /// use std::path::Path;
    ///
    /// use engine::JsonDirSink;
    ///
    /// let sink = JsonDirSink::new("jsons");
    /// let path = sink.path_for(Path::new("/videos/match_01.mp4")).unwrap();
    /// assert_eq!(path, Path::new("jsons/match_01.json"));
    /// ```
    pub fn path_for(&self, video_path: &Path) -> Result<PathBuf> {
        let stem = video_path
            .file_stem()
            .filter(|stem| !stem.is_empty())
            .ok_or_else(|| EngineError::InvalidVideoPath(video_path.to_path_buf()))?;
        // `with_extension` would drop dotted stems like "take.final".
        let mut file_name = stem.to_os_string();
        file_name.push(".");
        file_name.push(SCENE_FILE_EXTENSION);
        Ok(self.dir.join(file_name))
    }
}

impl SceneSink for JsonDirSink {
    fn write(&self, video_path: &Path, document: &SceneDocument) -> Result<PathBuf> {
        let path = self.path_for(video_path)?;
        fs::create_dir_all(&self.dir).map_err(|source| EngineError::SceneFileIo {
            context: "create scene directory",
            path: self.dir.clone(),
            source,
        })?;
        if path.exists() {
            debug!(path = ?path, "overwriting existing scene file");
        }
        write_scene_document(&path, document)?;
        info!(path = ?path, scene_count = document.scenes.len(), "scenes exported");
        Ok(path)
    }

    fn read(&self, video_path: &Path) -> Result<Option<SceneDocument>> {
        let path = self.path_for(video_path)?;
        if !path.exists() {
            return Ok(None);
        }
        read_scene_document(&path).map(Some)
    }
}

/// Writes `document` to `path` as indented JSON.
pub fn write_scene_document(path: &Path, document: &SceneDocument) -> Result<()> {
    let bytes = document
        .to_json_bytes()
        .map_err(|source| EngineError::SceneFileSerialization {
            path: path.to_path_buf(),
            source,
        })?;
    fs::write(path, bytes).map_err(|source| EngineError::SceneFileIo {
        context: "write scene file",
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a scene document previously written by [`write_scene_document`].
pub fn read_scene_document(path: &Path) -> Result<SceneDocument> {
    let text = fs::read_to_string(path).map_err(|source| EngineError::SceneFileIo {
        context: "read scene file",
        path: path.to_path_buf(),
        source,
    })?;
    SceneDocument::from_json(&text).map_err(|source| EngineError::SceneFileSerialization {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::{JsonDirSink, SceneDocument, SceneSink, read_scene_document};
    use crate::error::EngineError;
    use crate::timeline::{MarkPolicy, Scene, Timeline};

    fn sample_document() -> SceneDocument {
        SceneDocument {
            scenes: vec![
                Scene {
                    id: 1,
                    start_frame: 1,
                    end_frame: Some(26),
                },
                Scene {
                    id: 2,
                    start_frame: 27,
                    end_frame: None,
                },
            ],
        }
    }

    #[test]
    fn empty_timeline_has_nothing_to_export() {
        let timeline = Timeline::new(100, MarkPolicy::default());

        assert!(matches!(
            SceneDocument::from_timeline(&timeline),
            Err(EngineError::NothingToExport)
        ));
    }

    #[test]
    fn open_scene_is_serialized_without_end_frame() {
        let json = sample_document().to_json().expect("serialize");

        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        let scenes = value["scenes"].as_array().expect("scenes array");
        assert_eq!(scenes[0]["end_frame"], 26);
        assert!(scenes[1].get("end_frame").is_none());
        assert!(json.contains("\n    \"scenes\""));
        assert_eq!(
            sample_document().to_json_bytes().expect("serialize"),
            json.into_bytes()
        );
    }

    #[test]
    fn parsing_serialized_document_yields_same_scenes() {
        let document = sample_document();

        let parsed = SceneDocument::from_json(&document.to_json().expect("serialize"))
            .expect("parse");

        assert_eq!(parsed, document);
    }

    #[test]
    fn path_for_uses_video_stem() {
        let sink = JsonDirSink::new("out");

        assert_eq!(
            sink.path_for(Path::new("clips/take.final.mkv"))
                .expect("path"),
            Path::new("out/take.final.json")
        );
        assert!(matches!(
            sink.path_for(Path::new("/")),
            Err(EngineError::InvalidVideoPath(_))
        ));
    }

    #[test]
    fn sink_creates_directory_and_overwrites_existing_file() {
        let root = tempfile::tempdir().expect("temp dir");
        let sink = JsonDirSink::new(root.path().join("jsons"));
        let video = Path::new("/media/demo.mp4");

        let first = sink
            .write(video, &sample_document())
            .expect("first write should succeed");
        let replacement = SceneDocument {
            scenes: vec![Scene {
                id: 1,
                start_frame: 1,
                end_frame: Some(5),
            }],
        };
        let second = sink
            .write(video, &replacement)
            .expect("second write should succeed");

        assert_eq!(first, second);
        assert_eq!(first, root.path().join("jsons").join("demo.json"));
        assert_eq!(read_scene_document(&first).expect("read back"), replacement);
    }

    #[test]
    fn sink_read_returns_none_when_no_file_exists() {
        let root = tempfile::tempdir().expect("temp dir");
        let sink = JsonDirSink::new(root.path());

        assert_eq!(sink.read(Path::new("missing.mp4")).expect("read"), None);
    }

    #[test]
    fn malformed_scene_file_is_reported() {
        let root = tempfile::tempdir().expect("temp dir");
        let path = root.path().join("broken.json");
        fs::write(&path, "{ \"scenes\": [ { \"id\": 1 } ] }").expect("write fixture");

        assert!(matches!(
            read_scene_document(&path),
            Err(EngineError::SceneFileSerialization { .. })
        ));
    }
}
