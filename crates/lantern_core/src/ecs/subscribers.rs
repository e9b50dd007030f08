//! # Subscriber Tables
//!
//! Each attached system owns a table mapping entity id to the index of the
//! first component tuple that entity satisfied.
//!
//! ## Layout
//!
//! ```text
//! slots:  [ (#0, 0) | tombstone | (#7, 1) | (#3, 0) ]
//! index:  { #0 -> 0, #7 -> 2, #3 -> 3 }
//! ```
//!
//! - Iteration walks `slots` front to back: insertion order.
//! - Removal tombstones the slot through the side index: O(1).
//! - Tombstones are compacted once they outnumber live entries.

use std::collections::HashMap;

use super::entity::EntityId;

/// Minimum slot count before compaction is considered.
const COMPACT_MIN_SLOTS: usize = 32;

/// One subscription: an entity and the tuple index it matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Subscription {
    /// The subscribed entity.
    pub entity: EntityId,
    /// Index of the first satisfied tuple.
    pub sub_index: usize,
}

/// Insertion-ordered entity → tuple index table.
#[derive(Clone, Debug, Default)]
pub struct SubscriberTable {
    /// Subscriptions in insertion order; `None` marks a removed entry.
    slots: Vec<Option<Subscription>>,
    /// Entity id → slot position.
    index: HashMap<EntityId, usize>,
}

impl SubscriberTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of subscribed entities.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Checks if no entity is subscribed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Checks if an entity is subscribed.
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.index.contains_key(&entity)
    }

    /// Matched tuple index of a subscribed entity.
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<usize> {
        let slot = *self.index.get(&entity)?;
        self.slots[slot].map(|s| s.sub_index)
    }

    /// Subscribes an entity at the end of the iteration order.
    ///
    /// Returns `false` (and changes nothing) if the entity is already
    /// subscribed.
    pub fn insert(&mut self, entity: EntityId, sub_index: usize) -> bool {
        if self.index.contains_key(&entity) {
            return false;
        }
        self.index.insert(entity, self.slots.len());
        self.slots.push(Some(Subscription { entity, sub_index }));
        true
    }

    /// Changes the matched index of a subscribed entity in place,
    /// keeping its iteration position.
    ///
    /// Returns `false` if the entity is not subscribed.
    pub fn set_index(&mut self, entity: EntityId, sub_index: usize) -> bool {
        let Some(&slot) = self.index.get(&entity) else {
            return false;
        };
        match self.slots[slot].as_mut() {
            Some(sub) => {
                sub.sub_index = sub_index;
                true
            }
            None => false,
        }
    }

    /// Unsubscribes an entity, returning its matched index.
    pub fn remove(&mut self, entity: EntityId) -> Option<usize> {
        let slot = self.index.remove(&entity)?;
        let removed = self.slots[slot].take().map(|s| s.sub_index);
        self.maybe_compact();
        removed
    }

    /// Removes every subscription.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.index.clear();
    }

    /// Iterates over subscriptions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = Subscription> + '_ {
        self.slots.iter().filter_map(|s| *s)
    }

    /// Entity ids in insertion order.
    #[must_use]
    pub fn entities(&self) -> Vec<EntityId> {
        self.iter().map(|s| s.entity).collect()
    }

    /// Drops tombstones once they outnumber live entries.
    fn maybe_compact(&mut self) {
        let live = self.index.len();
        let dead = self.slots.len() - live;
        if self.slots.len() < COMPACT_MIN_SLOTS || dead <= live {
            return;
        }

        self.slots.retain(Option::is_some);
        for (slot, sub) in self.slots.iter().enumerate() {
            if let Some(sub) = sub {
                self.index.insert(sub.entity, slot);
            }
        }
    }
}
