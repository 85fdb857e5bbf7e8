//! Frame-based sprite animation.
//!
//! A clip is a list of image paths shown for a fixed time each. Elapsed time
//! is kept in integer microseconds so that repeated small frame deltas do not
//! drift.
//!
//! The JSON format stores `frame_ms` for readability; it is converted to
//! microseconds on load.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct FrameAnimation {
    pub frames: Vec<String>,
    pub frame_us: u64,
    pub looping: bool,
}

impl FrameAnimation {
    pub fn new(frames: Vec<String>, frame_secs: f32, looping: bool) -> Self {
        Self {
            frames,
            frame_us: (frame_secs.max(0.0) * 1_000_000.0) as u64,
            looping,
        }
    }

    pub fn total_duration_us(&self) -> u64 {
        self.frame_us * self.frames.len() as u64
    }
}

/// Playback position within the current clip.
#[derive(Debug, Clone)]
pub struct AnimationState {
    pub clip_name: String,
    pub frame_index: usize,
    pub elapsed_us: u64,
    pub finished: bool,
}

impl AnimationState {
    pub fn new(clip_name: &str) -> Self {
        Self {
            clip_name: clip_name.to_string(),
            frame_index: 0,
            elapsed_us: 0,
            finished: false,
        }
    }

    /// Advance by `dt_us` and return the frame to show.
    pub fn tick<'a>(&mut self, dt_us: u64, clip: &'a FrameAnimation) -> Option<&'a str> {
        if clip.frames.is_empty() {
            return None;
        }
        if self.finished || clip.frame_us == 0 {
            return clip
                .frames
                .get(self.frame_index)
                .or(clip.frames.last())
                .map(String::as_str);
        }

        self.elapsed_us += dt_us;

        while self.elapsed_us >= clip.frame_us {
            self.elapsed_us -= clip.frame_us;
            self.frame_index += 1;

            if self.frame_index >= clip.frames.len() {
                if clip.looping {
                    self.frame_index = 0;
                } else {
                    self.frame_index = clip.frames.len() - 1;
                    self.elapsed_us = 0;
                    self.finished = true;
                    break;
                }
            }
        }

        Some(clip.frames[self.frame_index].as_str())
    }
}

/// Named clips attached to one sprite, with at most one playing.
#[derive(Debug, Clone, Default)]
pub struct Animator {
    clips: HashMap<String, FrameAnimation>,
    state: Option<AnimationState>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a clip. The first clip registered becomes current and its
    /// first frame is returned so the owner can show it immediately.
    pub fn add(&mut self, name: &str, clip: FrameAnimation) -> Option<String> {
        let first = clip.frames.first().cloned();
        self.clips.insert(name.to_string(), clip);
        if self.state.is_none() {
            self.state = Some(AnimationState::new(name));
            return first;
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn current(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.clip_name.as_str())
    }

    pub fn is_finished(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.finished)
    }

    /// Switch to `name`, restarting it if it differs from the current clip.
    /// Returns the first frame on a switch.
    pub fn play(&mut self, name: &str) -> Option<String> {
        if self.current() == Some(name) {
            return None;
        }
        let clip = self.clips.get(name)?;
        self.state = Some(AnimationState::new(name));
        clip.frames.first().cloned()
    }

    /// Advance the current clip; returns the frame to show.
    pub fn tick(&mut self, dt_secs: f64) -> Option<String> {
        let state = self.state.as_mut()?;
        let clip = self.clips.get(&state.clip_name)?;
        let dt_us = (dt_secs.max(0.0) * 1_000_000.0) as u64;
        state.tick(dt_us, clip).map(str::to_string)
    }
}

#[derive(Debug, Deserialize)]
struct AnimationFileJson {
    animations: HashMap<String, AnimationClipJson>,
}

#[derive(Debug, Deserialize)]
struct AnimationClipJson {
    frames: Vec<String>,
    frame_ms: u64,
    #[serde(default = "default_looping")]
    looping: bool,
}

const fn default_looping() -> bool {
    true
}

/// Load a clip set from disk.
pub fn load_animation_file(path: &Path) -> Result<HashMap<String, FrameAnimation>, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read animation file {}: {e}", path.display()))?;
    let json: AnimationFileJson = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse animation file {}: {e}", path.display()))?;
    validate_animation_json(&json)?;

    Ok(json
        .animations
        .into_iter()
        .map(|(name, clip)| {
            (
                name,
                FrameAnimation {
                    frames: clip.frames,
                    frame_us: clip.frame_ms * 1000,
                    looping: clip.looping,
                },
            )
        })
        .collect())
}

fn validate_animation_json(json: &AnimationFileJson) -> Result<(), String> {
    for (name, clip) in &json.animations {
        if clip.frames.is_empty() {
            return Err(format!(
                "Animation validation failed: clip '{}' has no frames",
                name
            ));
        }
        if clip.frame_ms == 0 {
            return Err(format!(
                "Animation validation failed: clip '{}' has zero frame duration",
                name
            ));
        }
        if let Some(i) = clip.frames.iter().position(String::is_empty) {
            return Err(format!(
                "Animation validation failed: clip '{}' frame {} has an empty path",
                name, i
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_clip(count: usize, frame_ms: u64, looping: bool) -> FrameAnimation {
        FrameAnimation {
            frames: (0..count).map(|i| format!("frame_{i}.png")).collect(),
            frame_us: frame_ms * 1000,
            looping,
        }
    }

    #[test]
    fn tick_advances_through_frames() {
        let clip = make_clip(3, 100, true);
        let mut state = AnimationState::new("walk");

        assert_eq!(state.tick(0, &clip), Some("frame_0.png"));
        assert_eq!(state.tick(50_000, &clip), Some("frame_0.png"));
        assert_eq!(state.tick(60_000, &clip), Some("frame_1.png"));
    }

    #[test]
    fn looping_wraps_around() {
        let clip = make_clip(2, 100, true);
        let mut state = AnimationState::new("idle");
        assert_eq!(state.tick(250_000, &clip), Some("frame_0.png"));
        assert!(!state.finished);
    }

    #[test]
    fn non_looping_stops_on_last_frame() {
        let clip = make_clip(2, 100, false);
        let mut state = AnimationState::new("jump");
        assert_eq!(state.tick(300_000, &clip), Some("frame_1.png"));
        assert!(state.finished);
        assert_eq!(state.tick(100_000, &clip), Some("frame_1.png"));
    }

    #[test]
    fn empty_clip_yields_nothing() {
        let clip = make_clip(0, 100, true);
        let mut state = AnimationState::new("none");
        assert_eq!(state.tick(10, &clip), None);
    }

    #[test]
    fn animator_first_clip_becomes_current() {
        let mut animator = Animator::new();
        let first = animator.add("idle", make_clip(2, 100, true));
        assert_eq!(first.as_deref(), Some("frame_0.png"));
        assert!(animator.add("run", make_clip(3, 50, true)).is_none());
        assert_eq!(animator.current(), Some("idle"));
    }

    #[test]
    fn animator_play_switches_and_resets() {
        let mut animator = Animator::new();
        animator.add("idle", make_clip(2, 100, true));
        animator.add("run", make_clip(3, 50, true));
        animator.tick(0.15);

        assert_eq!(animator.play("run").as_deref(), Some("frame_0.png"));
        assert!(animator.play("run").is_none(), "same clip must not restart");
        assert_eq!(animator.tick(0.06).as_deref(), Some("frame_1.png"));
        assert!(animator.play("missing").is_none());
        assert_eq!(animator.current(), Some("run"));
    }

    #[test]
    fn frame_animation_from_seconds() {
        let clip = FrameAnimation::new(vec!["a.png".into()], 0.1, false);
        assert_eq!(clip.frame_us, 100_000);
        assert_eq!(clip.total_duration_us(), 100_000);
    }

    #[test]
    fn load_animation_file_parses_valid_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("hero.json");
        fs::write(
            &path,
            r#"{
              "animations": {
                "idle": { "frames": ["idle_0.png", "idle_1.png"], "frame_ms": 100 },
                "jump": { "frames": ["jump.png"], "frame_ms": 120, "looping": false }
              }
            }"#,
        )
        .expect("write temp file");

        let clips = load_animation_file(&path).expect("should parse");
        assert_eq!(clips.len(), 2);
        assert!(clips["idle"].looping);
        assert_eq!(clips["idle"].frame_us, 100_000);
        assert!(!clips["jump"].looping);
    }

    #[test]
    fn load_animation_file_rejects_zero_duration() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.json");
        fs::write(
            &path,
            r#"{ "animations": { "idle": { "frames": ["a.png"], "frame_ms": 0 } } }"#,
        )
        .expect("write temp file");
        let err = load_animation_file(&path).expect_err("zero duration should fail");
        assert!(err.contains("zero frame duration"));
    }
}
