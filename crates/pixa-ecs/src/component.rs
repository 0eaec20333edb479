//! Component type registration and per-type storage.
//!
//! Each component type gets a human-readable name in the
//! [`ComponentRegistry`] (used in logs and errors) and one
//! [`ComponentStorage`] column inside the [`World`](crate::world::World).
//! Columns are ordered by [`EntityId`] so iteration order is stable from run
//! to run.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};

use crate::entity::EntityId;

/// Bound every component type must satisfy.
pub trait Component: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Component for T {}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

/// Maps Rust types to registered component names.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    names: HashMap<TypeId, String>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `name`. Re-registering keeps the first name.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already taken by a different type.
    pub fn register<T: Component>(&mut self, name: &str) {
        let type_id = TypeId::of::<T>();
        if self.names.contains_key(&type_id) {
            return;
        }
        assert!(
            !self.names.values().any(|n| n == name),
            "component name '{name}' is already registered for a different type"
        );
        self.names.insert(type_id, name.to_owned());
    }

    pub fn is_registered<T: Component>(&self) -> bool {
        self.names.contains_key(&TypeId::of::<T>())
    }

    /// Registered name of `T`, or its Rust type name when unregistered.
    pub fn name_of<T: Component>(&self) -> &str {
        self.names
            .get(&TypeId::of::<T>())
            .map(String::as_str)
            .unwrap_or_else(|| std::any::type_name::<T>())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Registered names, sorted.
    pub fn registered_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.values().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

// ---------------------------------------------------------------------------
// ComponentStorage
// ---------------------------------------------------------------------------

/// Type-erased view of a storage column, used for despawn bookkeeping.
pub(crate) trait ErasedStorage: Send + Sync {
    fn remove_entity(&mut self, entity: EntityId) -> bool;
    fn contains(&self, entity: EntityId) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// One column of components of a single type, keyed by entity.
#[derive(Debug)]
pub struct ComponentStorage<T> {
    items: BTreeMap<EntityId, T>,
}

impl<T> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self {
            items: BTreeMap::new(),
        }
    }
}

impl<T: Component> ComponentStorage<T> {
    /// Insert, returning the previous value for `entity` if any.
    pub fn insert(&mut self, entity: EntityId, value: T) -> Option<T> {
        self.items.insert(entity, value)
    }

    pub fn remove(&mut self, entity: EntityId) -> Option<T> {
        self.items.remove(&entity)
    }

    pub fn get(&self, entity: EntityId) -> Option<&T> {
        self.items.get(&entity)
    }

    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        self.items.get_mut(&entity)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.items.iter().map(|(e, v)| (*e, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.items.iter_mut().map(|(e, v)| (*e, v))
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.items.keys().copied()
    }
}

impl<T: Component> ErasedStorage for ComponentStorage<T> {
    fn remove_entity(&mut self, entity: EntityId) -> bool {
        self.items.remove(&entity).is_some()
    }

    fn contains(&self, entity: EntityId) -> bool {
        self.items.contains_key(&entity)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
