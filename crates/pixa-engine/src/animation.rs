//! Sprite animation system.
//!
//! Each tick, [`update_animators`] walks every entity that has an
//! [`Animator`] and:
//!
//! 1. Resolves the animator's controller through the [`AssetRegistry`].
//! 2. Starts the controller's default state if the animator has none yet.
//! 3. When no transition is pending, evaluates the transitions leaving the
//!    current state in authored order. The first one whose exit time and
//!    conditions all hold starts a transition.
//! 4. Advances a pending transition and switches state once its duration
//!    has elapsed. Transitions cut; there is no blending.
//! 5. Advances the current clip's frame cursor.
//! 6. Writes the frame's sprite sheet rectangle into the entity's [`Sprite`].
//!
//! Asset references are UUIDs resolved on every tick, so a reimported clip or
//! sheet is picked up without touching the components.
//!
//! Trigger parameters are consumed by every condition that reads them, even
//! when the transition holding that condition loses to an earlier one.

use std::sync::Arc;

use pixa_assets::animation::{
    AnimationClip, AnimatorController, SpriteSheet, TransitionCondition, WrapMode,
};
use pixa_assets::asset::Asset;
use pixa_assets::math::{Rect, Vec2};
use pixa_assets::registry::AssetRegistry;
use pixa_assets::uuid::AssetUuid;
use pixa_ecs::world::World;

use crate::components::{Animator, Sprite};

/// Name under which the engine registers [`update_animators`].
pub const ANIMATION_SYSTEM_NAME: &str = "animation";

// ---------------------------------------------------------------------------
// Frame cursor
// ---------------------------------------------------------------------------

/// Position inside a clip: a frame and the seconds spent on it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameCursor {
    pub index: usize,
    pub time: f32,
}

/// Move `cursor` forward by `delta` seconds of clip time.
///
/// `Loop` clips wrap to the first frame. `Once` and `PingPong` clips stop on
/// the last frame with the cursor time pinned to that frame's duration.
/// Clips with no frames or a non-positive total duration, and non-finite
/// deltas, leave the cursor untouched. An out-of-range index restarts the
/// clip.
pub fn advance_frames(clip: &AnimationClip, cursor: FrameCursor, delta: f32) -> FrameCursor {
    let count = clip.frame_count();
    let total = clip.total_duration();
    if count == 0 || !(total > 0.0) || !delta.is_finite() {
        return cursor;
    }

    let mut cursor = if cursor.index < count {
        cursor
    } else {
        FrameCursor::default()
    };
    cursor.time += delta;

    // A whole loop from any frame lands back on the same frame.
    if clip.wrap_mode == WrapMode::Loop && cursor.time >= total {
        cursor.time %= total;
    }

    while let Some(frame) = clip.frames.get(cursor.index) {
        if cursor.time < frame.duration {
            break;
        }
        if cursor.index + 1 < count {
            cursor.time -= frame.duration;
            cursor.index += 1;
        } else if clip.wrap_mode == WrapMode::Loop {
            cursor.time -= frame.duration;
            cursor.index = 0;
        } else {
            cursor.time = frame.duration;
            break;
        }
    }
    cursor
}

// ---------------------------------------------------------------------------
// Transition evaluation
// ---------------------------------------------------------------------------

/// Whether `state_time` has passed `exit_time` (normalized) of a clip lasting
/// `clip_duration` seconds. An unknown or empty clip never holds a transition
/// back.
pub fn exit_time_reached(state_time: f32, exit_time: f32, clip_duration: Option<f32>) -> bool {
    match clip_duration {
        Some(duration) if duration > 0.0 => state_time / duration >= exit_time,
        _ => true,
    }
}

/// Evaluate one condition against the animator. A name that is not a
/// parameter is looked up as a trigger, which is consumed if armed.
fn condition_holds(animator: &mut Animator, condition: &TransitionCondition) -> bool {
    match animator.parameters.get(&condition.parameter) {
        Some(value) => condition.evaluate(*value),
        None => animator.take_trigger(&condition.parameter),
    }
}

/// Pick the transition to start from the animator's current state.
///
/// Returns the target state and transition duration of the first eligible
/// transition whose conditions all hold. Every eligible transition has all of
/// its conditions evaluated so that triggers are consumed uniformly.
pub fn select_transition(
    animator: &mut Animator,
    controller: &AnimatorController,
    clip_duration: Option<f32>,
) -> Option<(String, f32)> {
    let current = animator.current_state.clone();
    let mut winner = None;

    for transition in controller.transitions_from(&current) {
        if transition.has_exit_time
            && !exit_time_reached(animator.state_time, transition.exit_time, clip_duration)
        {
            continue;
        }

        let mut satisfied = true;
        for condition in &transition.conditions {
            satisfied &= condition_holds(animator, condition);
        }

        if satisfied && winner.is_none() {
            winner = Some((
                transition.to_state.clone(),
                transition.transition_duration,
            ));
        }
    }
    winner
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// Sprite data produced for one entity in one tick.
#[derive(Debug, Clone, Copy)]
struct FrameOutput {
    texture: AssetUuid,
    rect: Rect,
    pivot: Vec2,
}

/// Advance every playing [`Animator`] by `dt` seconds and update sprites.
///
/// Entities are visited in id order. Animators with no controller, or whose
/// controller cannot be resolved, are left untouched.
pub fn update_animators(world: &mut World, registry: &mut AssetRegistry, dt: f32) {
    for entity in world.entities_with::<Animator>() {
        let Some(animator) = world.get_component_mut::<Animator>(entity) else {
            continue;
        };
        if !animator.is_playing || animator.controller.is_none() {
            continue;
        }

        let Some(output) = step_animator(animator, registry, dt) else {
            continue;
        };
        if let Some(sprite) = world.get_component_mut::<Sprite>(entity) {
            if output.texture.is_some() {
                sprite.texture = output.texture;
            }
            sprite.source_rect = output.rect;
            sprite.pivot = output.pivot;
        }
    }
}

/// Clear playback progress on every animator, e.g. when entering or leaving
/// play mode. Parameters are kept.
pub fn reset_animators(world: &mut World) {
    for (_, animator) in world.query_mut::<Animator>() {
        animator.reset_playback();
    }
}

fn step_animator(
    animator: &mut Animator,
    registry: &mut AssetRegistry,
    dt: f32,
) -> Option<FrameOutput> {
    let controller = registry.load_as::<AnimatorController>(animator.controller)?;

    if animator.current_state.is_empty() {
        animator.enter_state(controller.default_state.clone());
    }

    if !animator.is_transitioning {
        let clip_duration = state_clip(registry, &controller, &animator.current_state)
            .map(|(_, clip)| clip.total_duration());
        if let Some((target, duration)) = select_transition(animator, &controller, clip_duration)
        {
            tracing::debug!(
                from = %animator.current_state,
                to = %target,
                duration,
                "animator transition started"
            );
            animator.is_transitioning = true;
            animator.transition_to_state = target;
            animator.transition_duration = duration;
            animator.transition_time = 0.0;
        }
    }

    if animator.is_transitioning {
        animator.transition_time += dt;
        if animator.transition_time >= animator.transition_duration {
            let target = std::mem::take(&mut animator.transition_to_state);
            animator.cancel_transition();
            animator.enter_state(target);
        }
    }

    let output = advance_state(animator, registry, &controller, dt);
    animator.state_time += dt * animator.playback_speed;
    output
}

/// Advance the current state's clip and look up the sprite frame it lands
/// on. Returns `None` when any asset along the way is missing.
fn advance_state(
    animator: &mut Animator,
    registry: &mut AssetRegistry,
    controller: &AnimatorController,
    dt: f32,
) -> Option<FrameOutput> {
    let (state_speed, clip) = state_clip(registry, controller, &animator.current_state)?;
    if clip.frame_count() == 0 || !(clip.total_duration() > 0.0) {
        return None;
    }
    if clip.sprite_sheet_uuid.is_none() {
        return None;
    }
    let sheet = registry.load_as::<SpriteSheet>(clip.sprite_sheet_uuid)?;

    if animator.current_frame_index >= clip.frame_count() {
        tracing::debug!(
            state = %animator.current_state,
            index = animator.current_frame_index,
            "frame index past end of clip, restarting"
        );
        animator.current_frame_index = 0;
        animator.frame_time = 0.0;
    }

    let cursor = advance_frames(
        &clip,
        FrameCursor {
            index: animator.current_frame_index,
            time: animator.frame_time,
        },
        dt * animator.playback_speed * state_speed,
    );
    animator.current_frame_index = cursor.index;
    animator.frame_time = cursor.time;

    let frame_index = clip.frames[cursor.index].frame_index;
    match sheet.frame(frame_index) {
        Some(frame) => Some(FrameOutput {
            texture: sheet.texture_uuid,
            rect: frame.rect,
            pivot: frame.pivot,
        }),
        None => {
            tracing::warn!(
                clip = %clip.uuid(),
                sheet = %clip.sprite_sheet_uuid,
                frame_index,
                frames = sheet.frame_count(),
                "clip references a frame the sprite sheet does not have"
            );
            None
        }
    }
}

/// Speed and clip of the named state, if both resolve.
fn state_clip(
    registry: &mut AssetRegistry,
    controller: &AnimatorController,
    state: &str,
) -> Option<(f32, Arc<AnimationClip>)> {
    let state = controller.state(state)?;
    if state.clip_uuid.is_none() {
        return None;
    }
    let clip = registry.load_as::<AnimationClip>(state.clip_uuid)?;
    Some((state.speed, clip))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
