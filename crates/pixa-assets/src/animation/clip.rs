use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::error::AssetError;
use crate::metadata::{AssetMetadata, AssetType};
use crate::uuid::AssetUuid;

pub const DEFAULT_FRAME_RATE: f32 = 12.0;

/// What happens when playback reaches the last frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WrapMode {
    /// Hold the last frame.
    Once,
    #[default]
    Loop,
    /// Currently holds the last frame like `Once`.
    PingPong,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationFrame {
    /// Index into the sprite sheet's frame list.
    pub frame_index: usize,
    /// Seconds this frame stays on screen.
    pub duration: f32,
}

/// An ordered list of sprite sheet frames with per-frame durations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnimationClip {
    #[serde(skip)]
    metadata: AssetMetadata,
    #[serde(skip)]
    loaded: bool,
    pub sprite_sheet_uuid: AssetUuid,
    pub frames: Vec<AnimationFrame>,
    pub wrap_mode: WrapMode,
    /// Used for the duration of frames added without an explicit one.
    pub frame_rate: f32,
}

impl Default for AnimationClip {
    fn default() -> Self {
        Self {
            metadata: AssetMetadata::default(),
            loaded: false,
            sprite_sheet_uuid: AssetUuid::NONE,
            frames: Vec::new(),
            wrap_mode: WrapMode::Loop,
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

impl AnimationClip {
    pub fn new(sprite_sheet_uuid: AssetUuid, wrap_mode: WrapMode) -> Self {
        Self {
            sprite_sheet_uuid,
            wrap_mode,
            ..Self::default()
        }
    }

    /// Append `frame_index` for `1 / frame_rate` seconds.
    pub fn add_frame(&mut self, frame_index: usize) {
        let duration = if self.frame_rate > 0.0 {
            1.0 / self.frame_rate
        } else {
            0.0
        };
        self.add_frame_with_duration(frame_index, duration);
    }

    pub fn add_frame_with_duration(&mut self, frame_index: usize, duration: f32) {
        self.frames.push(AnimationFrame {
            frame_index,
            duration,
        });
    }

    pub fn frame(&self, index: usize) -> Option<&AnimationFrame> {
        self.frames.get(index)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Sum of all frame durations, in seconds.
    pub fn total_duration(&self) -> f32 {
        self.frames.iter().map(|f| f.duration).sum()
    }

    pub fn to_json(&self) -> Result<String, AssetError> {
        super::to_json("animation clip", &self.metadata, self)
    }
}

impl Asset for AnimationClip {
    fn asset_type(&self) -> AssetType {
        AssetType::AnimationClip
    }

    fn metadata(&self) -> &AssetMetadata {
        &self.metadata
    }

    fn set_metadata(&mut self, metadata: AssetMetadata) {
        self.metadata = metadata;
    }

    fn load(&mut self, data: &[u8]) -> Result<(), AssetError> {
        let parsed: AnimationClip =
            super::parse_json("animation clip", data, &mut self.metadata)?;
        self.sprite_sheet_uuid = parsed.sprite_sheet_uuid;
        self.frames = parsed.frames;
        self.wrap_mode = parsed.wrap_mode;
        self.frame_rate = parsed.frame_rate;
        self.loaded = true;
        Ok(())
    }

    fn unload(&mut self) {
        self.frames = Vec::new();
        self.loaded = false;
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn memory_usage(&self) -> usize {
        self.frames.len() * std::mem::size_of::<AnimationFrame>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_frame_uses_frame_rate() {
        let mut clip = AnimationClip::default();
        clip.frame_rate = 10.0;
        clip.add_frame(0);
        clip.add_frame(1);
        clip.add_frame_with_duration(2, 0.5);
        assert_eq!(clip.frame_count(), 3);
        assert!((clip.frame(0).unwrap().duration - 0.1).abs() < 1e-6);
        assert!((clip.total_duration() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn zero_frame_rate_adds_zero_duration() {
        let mut clip = AnimationClip::default();
        clip.frame_rate = 0.0;
        clip.add_frame(3);
        assert_eq!(clip.frame(0).unwrap().duration, 0.0);
    }

    #[test]
    fn json_defaults_and_wrap_mode_names() {
        let mut clip = AnimationClip::default();
        clip.load(br#"{"wrapMode": "pingPong"}"#).unwrap();
        assert_eq!(clip.wrap_mode, WrapMode::PingPong);
        assert_eq!(clip.frame_rate, DEFAULT_FRAME_RATE);
        assert!(clip.frames.is_empty());
        assert_eq!(clip.total_duration(), 0.0);
    }

    #[test]
    fn name_and_uuid_survive_save_and_load() {
        let mut clip = AnimationClip::default();
        clip.load(br#"{"name": "hero_run", "uuid": 31, "spriteSheetUuid": 5,
                       "frames": [{"frameIndex": 2, "duration": 0.25}]}"#)
            .unwrap();
        assert_eq!(clip.metadata().name, "hero_run");

        let saved = clip.to_json().unwrap();
        let mut back = AnimationClip::default();
        back.load(saved.as_bytes()).unwrap();
        assert_eq!(back.metadata().name, "hero_run");
        assert_eq!(back.metadata().uuid, AssetUuid::from_raw(31));
        assert_eq!(back.sprite_sheet_uuid, AssetUuid::from_raw(5));
        assert_eq!(back.frames, clip.frames);
    }
}
