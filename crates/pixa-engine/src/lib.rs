//! Pixa engine -- runtime core tying the ECS world to the asset pipeline.
//!
//! The [`Engine`](engine::Engine) owns a [`World`](pixa_ecs::world::World)
//! and an [`AssetRegistry`](pixa_assets::registry::AssetRegistry), runs a
//! fixed-timestep loop over named systems, and ships the sprite animation
//! system: [`Animator`](components::Animator) components are stepped through
//! their controller's state machine and write the current frame into a
//! [`Sprite`](components::Sprite).
//!
//! # Quick Start
//!
//! ```no_run
//! use pixa_engine::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = EngineConfig::from_file(std::path::Path::new("pixa.json"))?;
//!     init_logging(&config.log_filter);
//!
//!     let mut engine = Engine::new(config);
//!     engine.startup()?;
//!
//!     let hero = engine.registry().uuid_from_path(std::path::Path::new("datas/hero.animator"));
//!     let entity = engine.world_mut().spawn_with(Animator::new(hero));
//!     engine.world_mut().insert_component(entity, Sprite::default())?;
//!
//!     engine.enter_play_mode();
//!     engine.run_ticks(60);
//!     engine.shutdown()
//! }
//! ```

#![deny(unsafe_code)]

pub mod animation;
pub mod components;
pub mod config;
pub mod engine;
pub mod logging;

pub use pixa_assets;
pub use pixa_ecs;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::animation::{
        advance_frames, reset_animators, update_animators, FrameCursor, ANIMATION_SYSTEM_NAME,
    };
    pub use crate::components::{Animator, Sprite};
    pub use crate::config::{EngineConfig, TickConfig};
    pub use crate::engine::{Engine, PlayMode, SystemFn, TickDiagnostics};
    pub use crate::logging::init_logging;
    pub use pixa_assets::prelude::*;
    pub use pixa_ecs::prelude::*;
}
