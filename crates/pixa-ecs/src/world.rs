//! The [`World`] is the top-level ECS container. It owns the entity
//! allocator, the component registry and one storage column per component
//! type.

use std::any::TypeId;
use std::collections::HashMap;

use crate::component::{Component, ComponentRegistry, ComponentStorage, ErasedStorage};
use crate::entity::{EntityAllocator, EntityId};
use crate::EcsError;

/// Entity/component container.
#[derive(Default)]
pub struct World {
    allocator: EntityAllocator,
    registry: ComponentRegistry,
    storages: HashMap<TypeId, Box<dyn ErasedStorage>>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.allocator.alive_count())
            .field("components", &self.registry.registered_names())
            .finish()
    }
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Register a component type under a human-readable name.
    ///
    /// Registration is optional; unregistered types are reported by their
    /// Rust type name.
    pub fn register_component<T: Component>(&mut self, name: &str) {
        self.registry.register::<T>(name);
        self.storage_or_insert::<T>();
    }

    // -- spawn / despawn ----------------------------------------------------

    /// Spawn an entity with no components.
    pub fn spawn(&mut self) -> EntityId {
        self.allocator.allocate()
    }

    /// Spawn an entity carrying a single component.
    pub fn spawn_with<T: Component>(&mut self, component: T) -> EntityId {
        let entity = self.allocator.allocate();
        self.storage_or_insert::<T>().insert(entity, component);
        entity
    }

    /// Despawn an entity and drop all of its components.
    pub fn despawn(&mut self, entity: EntityId) -> Result<(), EcsError> {
        if !self.allocator.deallocate(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        for storage in self.storages.values_mut() {
            storage.remove_entity(entity);
        }
        tracing::trace!(entity = %entity, "despawned entity");
        Ok(())
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.allocator.is_alive(entity)
    }

    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// Every live entity, in slot order.
    pub fn entities(&self) -> Vec<EntityId> {
        self.allocator.iter_alive().collect()
    }

    // -- component access ---------------------------------------------------

    /// Attach `value` to `entity`, replacing any existing `T`.
    pub fn insert_component<T: Component>(
        &mut self,
        entity: EntityId,
        value: T,
    ) -> Result<(), EcsError> {
        if !self.allocator.is_alive(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        self.storage_or_insert::<T>().insert(entity, value);
        Ok(())
    }

    /// Detach and return `entity`'s `T`.
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) -> Result<T, EcsError> {
        if !self.allocator.is_alive(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        let name = self.registry.name_of::<T>().to_owned();
        self.storage_mut::<T>()
            .and_then(|s| s.remove(entity))
            .ok_or(EcsError::MissingComponent {
                entity,
                component: name,
            })
    }

    pub fn get_component<T: Component>(&self, entity: EntityId) -> Option<&T> {
        if !self.allocator.is_alive(entity) {
            return None;
        }
        self.storage::<T>()?.get(entity)
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        if !self.allocator.is_alive(entity) {
            return None;
        }
        self.storage_mut::<T>()?.get_mut(entity)
    }

    pub fn has_component<T: Component>(&self, entity: EntityId) -> bool {
        self.allocator.is_alive(entity)
            && self
                .storages
                .get(&TypeId::of::<T>())
                .is_some_and(|s| s.contains(entity))
    }

    // -- queries ------------------------------------------------------------

    /// Iterate every `(entity, &T)` in entity order.
    pub fn query<T: Component>(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.storage::<T>().into_iter().flat_map(|s| s.iter())
    }

    /// Iterate every `(entity, &mut T)` in entity order.
    pub fn query_mut<T: Component>(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.storage_mut::<T>().into_iter().flat_map(|s| s.iter_mut())
    }

    /// Iterate entities carrying both `A` and `B`.
    pub fn query2<A: Component, B: Component>(
        &self,
    ) -> impl Iterator<Item = (EntityId, &A, &B)> {
        let b_storage = self.storage::<B>();
        self.query::<A>().filter_map(move |(entity, a)| {
            let b = b_storage?.get(entity)?;
            Some((entity, a, b))
        })
    }

    /// Snapshot of the entities carrying `T`.
    ///
    /// Systems that need to touch several components of the same entity
    /// collect ids first and then borrow components one at a time.
    pub fn entities_with<T: Component>(&self) -> Vec<EntityId> {
        self.storage::<T>()
            .map(|s| s.entities().collect())
            .unwrap_or_default()
    }

    pub fn component_count<T: Component>(&self) -> usize {
        self.storage::<T>().map_or(0, ComponentStorage::len)
    }

    // -- storage helpers ----------------------------------------------------

    fn storage<T: Component>(&self) -> Option<&ComponentStorage<T>> {
        self.storages
            .get(&TypeId::of::<T>())
            .and_then(|s| s.as_any().downcast_ref::<ComponentStorage<T>>())
    }

    fn storage_mut<T: Component>(&mut self) -> Option<&mut ComponentStorage<T>> {
        self.storages
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut::<ComponentStorage<T>>())
    }

    fn storage_or_insert<T: Component>(&mut self) -> &mut ComponentStorage<T> {
        self.storages
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStorage::<T>::default()))
            .as_any_mut()
            .downcast_mut::<ComponentStorage<T>>()
            .expect("storage column keyed by TypeId always holds that type")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }

    #[test]
    fn insert_get_remove_roundtrip() {
        let mut world = World::new();
        let e = world.spawn();
        world
            .insert_component(e, Position { x: 1.0, y: 2.0 })
            .unwrap();
        assert_eq!(
            world.get_component::<Position>(e),
            Some(&Position { x: 1.0, y: 2.0 })
        );
        let removed = world.remove_component::<Position>(e).unwrap();
        assert_eq!(removed.x, 1.0);
        assert!(!world.has_component::<Position>(e));
    }

    #[test]
    fn remove_missing_component_reports_name() {
        let mut world = World::new();
        world.register_component::<Velocity>("velocity");
        let e = world.spawn();
        let err = world.remove_component::<Velocity>(e).unwrap_err();
        assert!(err.to_string().contains("velocity"), "got: {err}");
    }

    #[test]
    fn despawn_drops_every_column() {
        let mut world = World::new();
        let e = world.spawn_with(Position { x: 0.0, y: 0.0 });
        world
            .insert_component(e, Velocity { dx: 1.0, dy: 1.0 })
            .unwrap();
        world.despawn(e).unwrap();
        assert_eq!(world.component_count::<Position>(), 0);
        assert_eq!(world.component_count::<Velocity>(), 0);
        assert!(world.get_component::<Position>(e).is_none());
    }

    #[test]
    fn stale_handle_does_not_see_new_occupant() {
        let mut world = World::new();
        let old = world.spawn_with(Position { x: 1.0, y: 1.0 });
        world.despawn(old).unwrap();
        let new = world.spawn_with(Position { x: 9.0, y: 9.0 });
        assert_eq!(old.index(), new.index());
        assert!(world.get_component::<Position>(old).is_none());
        assert!(world.insert_component(old, Velocity { dx: 0.0, dy: 0.0 }).is_err());
    }

    #[test]
    fn query2_only_yields_entities_with_both() {
        let mut world = World::new();
        let both = world.spawn_with(Position { x: 1.0, y: 2.0 });
        world
            .insert_component(both, Velocity { dx: 3.0, dy: 4.0 })
            .unwrap();
        world.spawn_with(Position { x: 5.0, y: 6.0 });

        let hits: Vec<_> = world.query2::<Position, Velocity>().collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, both);
    }

    #[test]
    fn query_mut_updates_in_place() {
        let mut world = World::new();
        let e = world.spawn_with(Velocity { dx: 1.0, dy: 2.0 });
        for (_, vel) in world.query_mut::<Velocity>() {
            vel.dx *= 2.0;
        }
        assert_eq!(world.get_component::<Velocity>(e).unwrap().dx, 2.0);
    }
}
