//! Components read and written by the animation system.
//!
//! [`Animator`] holds per-entity state machine progress and gameplay
//! parameters. [`Sprite`] is the renderer-facing output: the animation
//! system writes the current frame's rectangle into it every tick.

use std::collections::BTreeMap;

use pixa_assets::animation::{AnimatorController, ParameterType, ParameterValue};
use pixa_assets::math::{Rect, Vec2};
use pixa_assets::uuid::AssetUuid;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Animator
// ---------------------------------------------------------------------------

/// Drives an entity's sprite through an [`AnimatorController`].
///
/// The controller is referenced by UUID and resolved through the asset
/// registry on every update. An empty `current_state` means "not started";
/// the first update moves the animator to the controller's default state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Animator {
    pub controller: AssetUuid,
    pub is_playing: bool,
    pub playback_speed: f32,

    pub current_state: String,
    /// Seconds spent in `current_state`, scaled by `playback_speed`.
    pub state_time: f32,
    pub current_frame_index: usize,
    /// Seconds into the current frame.
    pub frame_time: f32,

    pub is_transitioning: bool,
    pub transition_to_state: String,
    pub transition_time: f32,
    pub transition_duration: f32,

    pub parameters: BTreeMap<String, ParameterValue>,
    pub triggers: BTreeMap<String, bool>,
}

impl Default for Animator {
    fn default() -> Self {
        Self {
            controller: AssetUuid::NONE,
            is_playing: true,
            playback_speed: 1.0,
            current_state: String::new(),
            state_time: 0.0,
            current_frame_index: 0,
            frame_time: 0.0,
            is_transitioning: false,
            transition_to_state: String::new(),
            transition_time: 0.0,
            transition_duration: 0.0,
            parameters: BTreeMap::new(),
            triggers: BTreeMap::new(),
        }
    }
}

impl Animator {
    pub fn new(controller: AssetUuid) -> Self {
        Self {
            controller,
            ..Self::default()
        }
    }

    /// Seed every non-trigger parameter with the controller's default value.
    /// Parameters already set on the animator are overwritten.
    pub fn with_controller_defaults(mut self, controller: &AnimatorController) -> Self {
        for param in &controller.parameters {
            if param.param_type != ParameterType::Trigger {
                self.parameters
                    .insert(param.name.clone(), param.default_value);
            }
        }
        self
    }

    // -- parameters ---------------------------------------------------------

    pub fn set_float(&mut self, name: &str, value: f32) {
        self.parameters
            .insert(name.to_owned(), ParameterValue::Float(value));
    }

    pub fn set_int(&mut self, name: &str, value: i32) {
        self.parameters
            .insert(name.to_owned(), ParameterValue::Int(value));
    }

    pub fn set_bool(&mut self, name: &str, value: bool) {
        self.parameters
            .insert(name.to_owned(), ParameterValue::Bool(value));
    }

    /// Arm a trigger. It stays set until a transition condition consumes it
    /// or [`reset_trigger`](Self::reset_trigger) clears it.
    pub fn set_trigger(&mut self, name: &str) {
        self.triggers.insert(name.to_owned(), true);
    }

    pub fn reset_trigger(&mut self, name: &str) {
        self.triggers.remove(name);
    }

    pub fn parameter(&self, name: &str) -> Option<ParameterValue> {
        self.parameters.get(name).copied()
    }

    pub fn get_float(&self, name: &str) -> Option<f32> {
        self.parameter(name)?.as_float()
    }

    pub fn get_int(&self, name: &str) -> Option<i32> {
        self.parameter(name)?.as_int()
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.parameter(name)?.as_bool()
    }

    pub fn is_trigger_set(&self, name: &str) -> bool {
        self.triggers.get(name).copied().unwrap_or(false)
    }

    /// Consume `name` if it is an armed trigger.
    pub(crate) fn take_trigger(&mut self, name: &str) -> bool {
        match self.triggers.get_mut(name) {
            Some(armed) if *armed => {
                *armed = false;
                true
            }
            _ => false,
        }
    }

    // -- playback -----------------------------------------------------------

    pub fn play(&mut self) {
        self.is_playing = true;
    }

    pub fn stop(&mut self) {
        self.is_playing = false;
    }

    /// Forget all playback progress. Parameters and triggers are kept.
    pub fn reset_playback(&mut self) {
        self.current_state.clear();
        self.state_time = 0.0;
        self.current_frame_index = 0;
        self.frame_time = 0.0;
        self.cancel_transition();
    }

    pub(crate) fn enter_state(&mut self, state: String) {
        self.current_state = state;
        self.state_time = 0.0;
        self.current_frame_index = 0;
        self.frame_time = 0.0;
    }

    pub(crate) fn cancel_transition(&mut self) {
        self.is_transitioning = false;
        self.transition_to_state.clear();
        self.transition_time = 0.0;
        self.transition_duration = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Sprite
// ---------------------------------------------------------------------------

/// What the renderer draws for an entity: a rectangle of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sprite {
    pub texture: AssetUuid,
    /// Source rectangle in texture pixels.
    pub source_rect: Rect,
    /// Normalized anchor inside `source_rect`.
    pub pivot: Vec2,
    pub visible: bool,
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            texture: AssetUuid::NONE,
            source_rect: Rect::default(),
            pivot: Vec2::splat(0.5),
            visible: true,
        }
    }
}

impl Sprite {
    pub fn new(texture: AssetUuid) -> Self {
        Self {
            texture,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_animator_plays_at_unit_speed() {
        let animator = Animator::new(AssetUuid::from_raw(9));
        assert!(animator.is_playing);
        assert_eq!(animator.playback_speed, 1.0);
        assert!(animator.current_state.is_empty());
    }

    #[test]
    fn typed_getters_reject_other_kinds() {
        let mut animator = Animator::default();
        animator.set_int("hp", 3);
        animator.set_float("speed", 1.5);
        animator.set_bool("grounded", true);

        assert_eq!(animator.get_int("hp"), Some(3));
        assert_eq!(animator.get_float("hp"), None);
        assert_eq!(animator.get_float("speed"), Some(1.5));
        assert_eq!(animator.get_bool("grounded"), Some(true));
        assert_eq!(animator.get_bool("missing"), None);
    }

    #[test]
    fn triggers_are_consumed_once() {
        let mut animator = Animator::default();
        animator.set_trigger("jump");
        assert!(animator.is_trigger_set("jump"));
        assert!(animator.take_trigger("jump"));
        assert!(!animator.take_trigger("jump"));
        assert!(!animator.is_trigger_set("jump"));

        animator.set_trigger("attack");
        animator.reset_trigger("attack");
        assert!(!animator.take_trigger("attack"));
    }

    #[test]
    fn controller_defaults_skip_triggers() {
        let mut controller = AnimatorController::new();
        controller.add_parameter("speed", ParameterType::Float, ParameterValue::Float(2.0));
        controller.add_parameter("jump", ParameterType::Trigger, ParameterValue::Bool(false));

        let animator = Animator::default().with_controller_defaults(&controller);
        assert_eq!(animator.get_float("speed"), Some(2.0));
        assert!(animator.parameter("jump").is_none());
    }

    #[test]
    fn reset_playback_keeps_parameters() {
        let mut animator = Animator::default();
        animator.set_int("hp", 1);
        animator.current_state = "run".into();
        animator.state_time = 2.0;
        animator.current_frame_index = 3;
        animator.is_transitioning = true;
        animator.transition_to_state = "idle".into();
        animator.transition_time = 0.1;

        animator.reset_playback();
        assert!(animator.current_state.is_empty());
        assert_eq!(animator.state_time, 0.0);
        assert_eq!(animator.current_frame_index, 0);
        assert!(!animator.is_transitioning);
        assert!(animator.transition_to_state.is_empty());
        assert_eq!(animator.get_int("hp"), Some(1));
    }

    #[test]
    fn animator_json_round_trip() {
        let mut animator = Animator::new(AssetUuid::from_raw(42));
        animator.set_bool("grounded", true);
        let json = serde_json::to_string(&animator).unwrap();
        let back: Animator = serde_json::from_str(&json).unwrap();
        assert_eq!(back, animator);
    }
}
