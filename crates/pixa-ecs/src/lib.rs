//! Pixa ECS -- a small, safe Entity Component System for the Pixa engine.
//!
//! Components live in one ordered column per type, keyed by a generational
//! [`EntityId`](entity::EntityId). Iteration always walks entities in id
//! order, so systems that run over the same world produce the same results
//! run after run.
//!
//! # Quick Start
//!
//! ```
//! use pixa_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Position { x: f32, y: f32 }
//!
//! let mut world = World::new();
//! world.register_component::<Position>("position");
//!
//! let entity = world.spawn_with(Position { x: 0.0, y: 0.0 });
//! assert_eq!(world.get_component::<Position>(entity), Some(&Position { x: 0.0, y: 0.0 }));
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by ECS operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The entity does not exist (stale generation or never allocated).
    #[error("entity {entity:?} does not exist (stale or never allocated)")]
    StaleEntity { entity: entity::EntityId },

    /// The entity is alive but does not carry the requested component.
    #[error("entity {entity:?} has no '{component}' component")]
    MissingComponent {
        entity: entity::EntityId,
        component: String,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{Component, ComponentRegistry, ComponentStorage};
    pub use crate::entity::{EntityAllocator, EntityId};
    pub use crate::world::World;
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
