//! # Entity Management
//!
//! Entities are mutable bags of components addressed by a stable numeric id.
//! Ids are assigned monotonically from 0 and never reused within a world;
//! the world-wide singleton entity uses the reserved id -1.

use std::collections::btree_map;
use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::component::{AnyComponent, Component, ComponentRecord};
use crate::error::EcsResult;

/// Unique identifier for an entity within one world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct EntityId(i64);

impl EntityId {
    /// Id of the singleton entity. Never part of the normal id sequence.
    pub const SINGLETON: Self = Self(-1);

    /// Creates an entity ID from its raw value.
    #[inline]
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Checks if this is the singleton id.
    #[inline]
    #[must_use]
    pub const fn is_singleton(self) -> bool {
        self.0 == Self::SINGLETON.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic id source. Ids only increase.
#[derive(Clone, Debug, Default)]
pub struct IdAllocator {
    next: i64,
}

impl IdAllocator {
    /// Issues the next id.
    #[inline]
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// Ensures future ids are greater than `id`.
    #[inline]
    pub fn advance_past(&mut self, id: EntityId) {
        self.next = self.next.max(id.0 + 1);
    }

    /// The id the next call to [`allocate`](Self::allocate) returns.
    #[inline]
    #[must_use]
    pub const fn peek(&self) -> EntityId {
        EntityId(self.next)
    }
}

/// An entity: at most one component per type tag.
#[derive(Clone, Debug)]
pub struct Entity {
    /// The unique identifier for this entity.
    id: EntityId,
    /// Attached components keyed by tag.
    components: HashMap<&'static str, Box<dyn AnyComponent>>,
    /// Set when the tag set changes; cleared once subscriptions are synced.
    components_changed: bool,
}

impl Entity {
    /// Creates an entity with no components.
    #[must_use]
    pub fn new(id: EntityId) -> Self {
        Self {
            id,
            components: HashMap::new(),
            components_changed: false,
        }
    }

    /// Returns the entity's id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Checks if a component with this tag is attached.
    #[inline]
    #[must_use]
    pub fn has_component(&self, tag: &str) -> bool {
        self.components.contains_key(tag)
    }

    /// Checks if a component of type `T` is attached.
    #[inline]
    #[must_use]
    pub fn has<T: Component>(&self) -> bool {
        self.has_component(T::TAG)
    }

    /// Gets the attached component of type `T`.
    #[must_use]
    pub fn component<T: Component>(&self) -> Option<&T> {
        self.components
            .get(T::TAG)
            .and_then(|c| c.as_any().downcast_ref::<T>())
    }

    /// Gets the attached component of type `T` mutably.
    ///
    /// Value edits never change the tag set, so subscriptions are unaffected.
    pub fn component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components
            .get_mut(T::TAG)
            .and_then(|c| c.as_any_mut().downcast_mut::<T>())
    }

    /// Gets the attached component by tag, type-erased.
    #[must_use]
    pub fn component_by_tag(&self, tag: &str) -> Option<&dyn AnyComponent> {
        self.components.get(tag).map(|c| &**c)
    }

    /// Attaches a component, overwriting any component with the same tag.
    ///
    /// Returns the overwritten component. Subscriptions are NOT updated;
    /// the world re-validates or the caller re-registers.
    pub fn add_component<T: Component>(&mut self, component: T) -> Option<T> {
        self.add_boxed(Box::new(component))
            .and_then(|old| old.into_any().downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Attaches a type-erased component, overwriting the same tag.
    pub fn add_boxed(&mut self, component: Box<dyn AnyComponent>) -> Option<Box<dyn AnyComponent>> {
        let previous = self.components.insert(component.tag(), component);
        if previous.is_none() {
            self.components_changed = true;
        }
        previous
    }

    /// Detaches the component with this tag. No-op if absent.
    pub fn remove_component(&mut self, tag: &str) -> Option<Box<dyn AnyComponent>> {
        let removed = self.components.remove(tag);
        if removed.is_some() {
            self.components_changed = true;
        }
        removed
    }

    /// Detaches the component of type `T`.
    pub fn remove<T: Component>(&mut self) -> Option<T> {
        self.remove_component(T::TAG)
            .and_then(|old| old.into_any().downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Iterates over the attached tags (unordered).
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.components.keys().copied()
    }

    /// Number of attached components.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Checks if no components are attached.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Whether the tag set changed since subscriptions were last synced.
    #[inline]
    #[must_use]
    pub const fn components_changed(&self) -> bool {
        self.components_changed
    }

    #[inline]
    pub(crate) fn mark_synced(&mut self) {
        self.components_changed = false;
    }

    /// Encodes every component as a snapshot record, sorted by tag.
    ///
    /// # Errors
    ///
    /// Fails if any component fails to serialize.
    pub fn to_records(&self) -> EcsResult<Vec<ComponentRecord>> {
        let mut records = self
            .components
            .values()
            .map(|c| c.to_record())
            .collect::<EcsResult<Vec<_>>>()?;
        records.sort_by(|a, b| a.tag.cmp(&b.tag));
        Ok(records)
    }
}

/// All live entities of a world, iterated in id order.
#[derive(Clone, Debug, Default)]
pub struct EntityStore {
    entities: BTreeMap<EntityId, Entity>,
}

impl EntityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets an entity by ID.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Gets a mutable entity by ID.
    #[inline]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Checks if the store is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterates over live entities in id order.
    pub fn iter(&self) -> btree_map::Values<'_, EntityId, Entity> {
        self.entities.values()
    }

    /// Iterates mutably over live entities in id order.
    pub fn iter_mut(&mut self) -> btree_map::ValuesMut<'_, EntityId, Entity> {
        self.entities.values_mut()
    }

    /// Live entity ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    /// Entities carrying every tag in `tags`, in id order.
    pub fn with_tags<'a>(&'a self, tags: &'a [&'a str]) -> impl Iterator<Item = &'a Entity> + 'a {
        self.entities
            .values()
            .filter(move |e| tags.iter().all(|t| e.has_component(t)))
    }

    pub(crate) fn insert(&mut self, entity: Entity) -> Option<Entity> {
        self.entities.insert(entity.id(), entity)
    }

    pub(crate) fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }
}
