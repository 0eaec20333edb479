//! Shared fixtures: animation assets served from an in-memory game bundle.

#![allow(dead_code)]

use pixa_engine::prelude::*;

pub const TEXTURE: AssetUuid = AssetUuid::from_raw(0x100);
pub const SHEET: AssetUuid = AssetUuid::from_raw(0x200);
pub const IDLE_CLIP: AssetUuid = AssetUuid::from_raw(0x301);
pub const RUN_CLIP: AssetUuid = AssetUuid::from_raw(0x302);
pub const CONTROLLER: AssetUuid = AssetUuid::from_raw(0x400);

/// Wrap a JSON document in a `.pxa` package.
pub fn package(uuid: AssetUuid, asset_type: AssetType, json: &str) -> Vec<u8> {
    let metadata = AssetMetadata {
        uuid,
        asset_type,
        name: format!("{asset_type}-{uuid}"),
        source_file: format!("datas/{uuid}.{asset_type}"),
        version: 1,
        ..Default::default()
    };
    PackageCodec::to_bytes(&metadata, json.as_bytes()).unwrap()
}

/// A horizontal strip of `frames` 16x16 cells over [`TEXTURE`].
pub fn strip_sheet(frames: u32) -> SpriteSheet {
    let mut sheet = SpriteSheet::new(TEXTURE);
    sheet.slice_grid(frames * 16, 16, frames, 1);
    sheet
}

/// A clip over [`SHEET`] playing sheet frames `0..durations.len()`.
pub fn clip(wrap: WrapMode, durations: &[f32]) -> AnimationClip {
    let mut clip = AnimationClip::new(SHEET, wrap);
    for (i, d) in durations.iter().enumerate() {
        clip.add_frame_with_duration(i, *d);
    }
    clip
}

/// `idle` (frames 0..3 looping) and `run` (frame 3), switching on `speed`.
pub fn locomotion_controller() -> AnimatorController {
    let mut controller = AnimatorController::new();
    controller.add_parameter("speed", ParameterType::Float, ParameterValue::Float(0.0));
    controller.add_parameter("jump", ParameterType::Trigger, ParameterValue::Bool(false));
    controller.add_state("idle", IDLE_CLIP);
    controller.add_state("run", RUN_CLIP);
    controller.add_transition(StateTransition::new("idle", "run").with_condition(
        TransitionCondition::new("speed", ComparisonType::Greater, 0.5f32),
    ));
    controller.add_transition(StateTransition::new("run", "idle").with_condition(
        TransitionCondition::new("speed", ComparisonType::Less, 0.5f32),
    ));
    controller
}

pub fn run_clip() -> AnimationClip {
    let mut clip = AnimationClip::new(SHEET, WrapMode::Loop);
    clip.add_frame_with_duration(3, 0.5);
    clip
}

/// Registry with the given controller and idle clip plus the standard
/// sheet and run clip.
pub fn registry_with(controller: &AnimatorController, idle: &AnimationClip) -> AssetRegistry {
    registry_with_controller_json(&controller.to_json().unwrap(), idle)
}

/// Like [`registry_with`], with the controller given as a raw document.
pub fn registry_with_controller_json(controller: &str, idle: &AnimationClip) -> AssetRegistry {
    let mut writer = BundleWriter::new();
    for (uuid, ty, json) in [
        (SHEET, AssetType::SpriteSheet, strip_sheet(4).to_json().unwrap()),
        (IDLE_CLIP, AssetType::AnimationClip, idle.to_json().unwrap()),
        (RUN_CLIP, AssetType::AnimationClip, run_clip().to_json().unwrap()),
        (CONTROLLER, AssetType::AnimatorController, controller.to_owned()),
    ] {
        writer.add_package_bytes(package(uuid, ty, &json)).unwrap();
    }

    let mut registry = AssetRegistry::default();
    registry.mount_bundle(writer.to_bytes()).unwrap();
    registry
}

pub fn locomotion_registry() -> AssetRegistry {
    registry_with(
        &locomotion_controller(),
        &clip(WrapMode::Loop, &[0.1, 0.2, 0.1]),
    )
}

/// A world with one animated, sprite-carrying entity.
pub fn animated_world() -> (World, EntityId) {
    let mut world = World::new();
    let entity = world.spawn_with(Animator::new(CONTROLLER));
    world.insert_component(entity, Sprite::default()).unwrap();
    (world, entity)
}

pub fn animator(world: &World, entity: EntityId) -> &Animator {
    world.get_component::<Animator>(entity).unwrap()
}

pub fn sprite(world: &World, entity: EntityId) -> &Sprite {
    world.get_component::<Sprite>(entity).unwrap()
}

pub fn assert_close(a: f32, b: f32) {
    assert!((a - b).abs() < 1e-5, "{a} != {b}");
}
