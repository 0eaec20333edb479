//! Property tests for frame advance and the animation system.

mod common;

use common::*;
use pixa_engine::prelude::*;
use proptest::prelude::*;

fn wrap_strategy() -> impl Strategy<Value = WrapMode> {
    prop_oneof![
        Just(WrapMode::Once),
        Just(WrapMode::Loop),
        Just(WrapMode::PingPong),
    ]
}

fn durations_strategy() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec((1u32..1000).prop_map(|ms| ms as f32 / 1000.0), 1..8)
}

fn delta_strategy() -> impl Strategy<Value = f32> {
    (0u32..5000).prop_map(|ms| ms as f32 / 1000.0)
}

proptest! {
    #[test]
    fn cursor_stays_inside_current_frame(
        wrap in wrap_strategy(),
        durations in durations_strategy(),
        deltas in prop::collection::vec(delta_strategy(), 1..50),
    ) {
        let clip = clip(wrap, &durations);
        let mut cursor = FrameCursor::default();
        for delta in deltas {
            cursor = advance_frames(&clip, cursor, delta);
            prop_assert!(cursor.index < durations.len());
            prop_assert!(cursor.time >= 0.0);
            prop_assert!(cursor.time <= durations[cursor.index]);
        }
    }

    #[test]
    fn once_never_moves_backwards(
        durations in durations_strategy(),
        deltas in prop::collection::vec(delta_strategy(), 1..50),
    ) {
        let clip = clip(WrapMode::Once, &durations);
        let mut cursor = FrameCursor::default();
        for delta in deltas {
            let next = advance_frames(&clip, cursor, delta);
            prop_assert!(next.index >= cursor.index);
            cursor = next;
        }
    }

    #[test]
    fn animators_stay_on_valid_frames(
        idle in durations_strategy(),
        steps in prop::collection::vec((delta_strategy(), any::<bool>()), 1..40),
    ) {
        let idle_len = idle.len().min(4);
        let mut registry = registry_with(
            &locomotion_controller(),
            &clip(WrapMode::Loop, &idle[..idle_len]),
        );
        let (mut world, e) = animated_world();

        for (dt, running) in steps {
            world
                .get_component_mut::<Animator>(e)
                .unwrap()
                .set_float("speed", if running { 1.0 } else { 0.0 });
            update_animators(&mut world, &mut registry, dt);

            let animator = animator(&world, e);
            let frames = match animator.current_state.as_str() {
                "idle" => idle_len,
                "run" => 1,
                other => panic!("unexpected state {other:?}"),
            };
            prop_assert!(animator.current_frame_index < frames);
            prop_assert!(!animator.is_transitioning);
            prop_assert_eq!(
                sprite(&world, e).source_rect.x,
                16.0 * animator.current_frame_index as f32
                    + if animator.current_state == "run" { 48.0 } else { 0.0 }
            );
        }
    }
}
