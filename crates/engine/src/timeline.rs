use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Sequential scene identifier, starting at 1.
pub type SceneId = u32;

/// One annotated scene over 1-based frame numbers.
///
/// `end_frame` is `None` while the scene is open. Open scenes are
/// serialized without the `end_frame` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    pub start_frame: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_frame: Option<u64>,
}

impl Scene {
    pub fn is_open(&self) -> bool {
        self.end_frame.is_none()
    }
}

/// What `mark_start` does while the last scene is still open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OpenScenePolicy {
    /// Appends a new scene and leaves the open one unterminated.
    #[default]
    Append,
    /// Fails with `SceneAlreadyOpen`.
    Reject,
    /// Closes the open scene one frame before the playhead, then starts the
    /// new scene at the playhead.
    AutoClose,
}

/// What `mark_end` does when the last scene is already closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClosedScenePolicy {
    /// Replaces the recorded end frame.
    #[default]
    Overwrite,
    /// Fails with `SceneAlreadyClosed`.
    Reject,
}

/// Policies applied when marks conflict with the recorded scenes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkPolicy {
    pub open_scene: OpenScenePolicy,
    pub closed_scene: ClosedScenePolicy,
}

/// Scene list and playhead over a fixed-length frame timeline.
///
/// Frame *indices* are 0-based (the playhead), frame *numbers* are 1-based
/// (scene boundaries). Every mutating operation either applies completely
/// or leaves the timeline unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    total_frames: u64,
    current_frame_index: u64,
    scenes: Vec<Scene>,
    policy: MarkPolicy,
}

impl Timeline {
    /// Creates an empty timeline over `total_frames` frames.
    ///
    /// # Example
    /// ```
    /// use engine::timeline::{MarkPolicy, Timeline};
    ///
    /// let mut timeline = Timeline::new(100, MarkPolicy::default());
    /// timeline.navigate(5);
    /// assert_eq!(timeline.mark_start().unwrap(), 1);
    /// ```
    pub fn new(total_frames: u64, policy: MarkPolicy) -> Self {
        let mut timeline = Self {
            policy,
            ..Self::default()
        };
        timeline.load(total_frames);
        timeline
    }

    /// Resets scenes and playhead for a newly loaded video.
    pub fn load(&mut self, total_frames: u64) {
        self.total_frames = total_frames;
        self.current_frame_index = 0;
        self.scenes.clear();
        debug!(total_frames, "timeline loaded");
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn current_frame_index(&self) -> u64 {
        self.current_frame_index
    }

    /// 1-based number of the frame under the playhead.
    pub fn current_frame_number(&self) -> u64 {
        self.current_frame_index + 1
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Moves the playhead by `step` frames, clamped to the timeline.
    ///
    /// Returns the new playhead index. Never fails: out-of-range steps clamp.
    pub fn navigate(&mut self, step: i64) -> u64 {
        if self.total_frames == 0 {
            self.current_frame_index = 0;
            return 0;
        }

        let max_index = i128::from(self.total_frames - 1);
        let target = i128::from(self.current_frame_index) + i128::from(step);
        self.current_frame_index = target.clamp(0, max_index) as u64;
        self.current_frame_index
    }

    /// Opens a new scene and returns its start frame.
    ///
    /// The start frame is forced to follow the previous scene (or to 1 for
    /// the first scene); the playhead only has to lie inside the video.
    ///
    /// # Example
    /// ```
    /// use engine::timeline::{MarkPolicy, Timeline};
    ///
    /// let mut timeline = Timeline::new(100, MarkPolicy::default());
    /// timeline.navigate(25);
    /// timeline.mark_start().unwrap();
    /// assert_eq!(timeline.mark_end().unwrap(), 26);
    /// assert_eq!(timeline.mark_start().unwrap(), 27);
    /// ```
    pub fn mark_start(&mut self) -> Result<u64> {
        let candidate = self.candidate_frame()?;

        let (start_frame, close_open_at) = match self.scenes.last() {
            None => (1, None),
            Some(Scene {
                end_frame: Some(end_frame),
                ..
            }) => (end_frame + 1, None),
            Some(open) => match self.policy.open_scene {
                OpenScenePolicy::Append => {
                    let start_frame = self.last_closed_end().map_or(1, |end_frame| end_frame + 1);
                    (start_frame, None)
                }
                OpenScenePolicy::Reject => {
                    warn!(scene_id = open.id, "mark start rejected: scene still open");
                    return Err(EngineError::SceneAlreadyOpen { scene_id: open.id });
                }
                OpenScenePolicy::AutoClose => {
                    let end_frame = candidate - 1;
                    if end_frame <= open.start_frame {
                        warn!(
                            scene_id = open.id,
                            end_frame,
                            start_frame = open.start_frame,
                            "mark start rejected: auto-close would end before start"
                        );
                        return Err(EngineError::InvalidOrder {
                            end_frame,
                            start_frame: open.start_frame,
                        });
                    }
                    (end_frame + 1, Some(end_frame))
                }
            },
        };

        if let Some(end_frame) = close_open_at {
            if let Some(open) = self.scenes.last_mut() {
                open.end_frame = Some(end_frame);
                debug!(scene_id = open.id, end_frame, "open scene auto-closed");
            }
        }

        let id = self.next_scene_id();
        self.scenes.push(Scene {
            id,
            start_frame,
            end_frame: None,
        });

        debug!(
            scene_id = id,
            start_frame,
            requested_frame = candidate,
            "mark start accepted"
        );
        Ok(start_frame)
    }

    /// Closes the last scene at the playhead and returns its end frame.
    pub fn mark_end(&mut self) -> Result<u64> {
        let candidate = self.candidate_frame()?;
        let policy = self.policy.closed_scene;

        let Some(last) = self.scenes.last_mut() else {
            warn!(frame = candidate, "mark end rejected: no scene recorded");
            return Err(EngineError::NoOpenScene);
        };

        if candidate <= last.start_frame {
            warn!(
                scene_id = last.id,
                end_frame = candidate,
                start_frame = last.start_frame,
                "mark end rejected: end not after start"
            );
            return Err(EngineError::InvalidOrder {
                end_frame: candidate,
                start_frame: last.start_frame,
            });
        }

        if let Some(previous_end) = last.end_frame {
            if policy == ClosedScenePolicy::Reject {
                warn!(
                    scene_id = last.id,
                    end_frame = previous_end,
                    "mark end rejected: scene already closed"
                );
                return Err(EngineError::SceneAlreadyClosed {
                    scene_id: last.id,
                    end_frame: previous_end,
                });
            }
            debug!(
                scene_id = last.id,
                previous_end,
                end_frame = candidate,
                "overwriting end of closed scene"
            );
        }

        last.end_frame = Some(candidate);
        debug!(scene_id = last.id, end_frame = candidate, "mark end accepted");
        Ok(candidate)
    }

    /// Replaces the scene list with previously recorded scenes.
    ///
    /// Accepts exactly what marking under the current policy can record:
    /// sequential ids from 1, each start one past the latest earlier end (or
    /// 1), ends after their start and inside the video. Open scenes before
    /// the last one are only valid under `OpenScenePolicy::Append`. The
    /// playhead is left untouched.
    pub fn restore(&mut self, scenes: Vec<Scene>) -> Result<()> {
        validate_scenes(self.total_frames, self.policy.open_scene, &scenes)?;
        debug!(scene_count = scenes.len(), "scenes restored");
        self.scenes = scenes;
        Ok(())
    }

    fn candidate_frame(&self) -> Result<u64> {
        let candidate = self.current_frame_number();
        if candidate > self.total_frames {
            warn!(
                frame = candidate,
                total_frames = self.total_frames,
                "mark rejected: frame out of range"
            );
            return Err(EngineError::OutOfRange {
                frame: candidate,
                total_frames: self.total_frames,
            });
        }
        Ok(candidate)
    }

    fn last_closed_end(&self) -> Option<u64> {
        self.scenes.iter().rev().find_map(|scene| scene.end_frame)
    }

    fn next_scene_id(&self) -> SceneId {
        SceneId::try_from(self.scenes.len() + 1).unwrap_or(SceneId::MAX)
    }
}

fn validate_scenes(
    total_frames: u64,
    open_scene: OpenScenePolicy,
    scenes: &[Scene],
) -> Result<()> {
    let mut expected_start = 1;

    for (position, scene) in scenes.iter().enumerate() {
        let expected_id = position + 1;
        if scene.id as usize != expected_id {
            return Err(invalid(format!(
                "scene at position {position} has id {}, expected {expected_id}",
                scene.id
            )));
        }
        if scene.start_frame != expected_start {
            return Err(invalid(format!(
                "scene {} starts at frame {}, expected {expected_start}",
                scene.id, scene.start_frame
            )));
        }

        match scene.end_frame {
            Some(end_frame) => {
                if end_frame <= scene.start_frame {
                    return Err(invalid(format!(
                        "scene {} ends at frame {end_frame}, not after its start {}",
                        scene.id, scene.start_frame
                    )));
                }
                if end_frame > total_frames {
                    return Err(invalid(format!(
                        "scene {} ends at frame {end_frame}, beyond {total_frames} frames",
                        scene.id
                    )));
                }
                expected_start = end_frame + 1;
            }
            None if position + 1 != scenes.len() && open_scene != OpenScenePolicy::Append => {
                return Err(invalid(format!(
                    "scene {} is open but is not the last scene",
                    scene.id
                )));
            }
            None => {}
        }
    }

    Ok(())
}

fn invalid(reason: String) -> EngineError {
    EngineError::InvalidSceneFile { reason }
}
