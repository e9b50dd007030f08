//! # World Manager
//!
//! The central container for all entities, systems and the singleton entity.
//! Drives the three-phase frame protocol and maintains the subscription
//! tables that route per-entity work to the systems that care.
//!
//! ## Subscription rules
//!
//! - [`WorldManager::register_components`] subscribes an entity to every
//!   system where it is not yet subscribed, using the first tuple it
//!   satisfies. Existing subscriptions are left alone.
//! - [`WorldManager::recalculate_all_subscribers`] clears every table and
//!   registers every entity again.
//! - With `revalidate_subscriptions` on, entities whose tag set changed are
//!   fully re-checked before each update: stale matches are dropped, indices
//!   corrected and new matches added.
//! - Destroying an entity purges it from every table.

use std::collections::HashSet;

use crossbeam_channel::Sender;
use tracing::{debug, info};

use super::component::{Component, ComponentTuple};
use super::entity::{Entity, EntityId, EntityStore, IdAllocator};
use super::subscribers::SubscriberTable;
use super::system::{Command, Commands, EventOutlet, System, SystemContext};
use crate::config::{UpdateOrder, WorldConfig};
use crate::error::{EcsError, EcsResult};

/// An attached system with its cached tuples and subscriber table.
struct SystemSlot<E> {
    /// The system itself.
    system: Box<dyn System<E>>,
    /// Cached `system.name()`.
    name: String,
    /// Cached `system.component_tuples()`.
    tuples: Vec<ComponentTuple>,
    /// Subscribed entities in insertion order.
    subscribers: SubscriberTable,
}

impl<E> SystemSlot<E> {
    /// Index of the first tuple `entity` satisfies.
    fn first_match(&self, entity: &Entity) -> Option<usize> {
        self.tuples
            .iter()
            .position(|tuple| tuple.is_satisfied_by(|tag| entity.has_component(tag)))
    }
}

/// The ECS world: entities, systems and singletons.
///
/// Single-threaded. The embedding application calls
/// [`on_update`](Self::on_update) once per frame.
///
/// # Example
///
/// ```rust,ignore
/// let mut world: WorldManager = WorldManager::new();
/// world.add_system(MovementSystem)?;
///
/// let id = world.create_entity();
/// if let Some(entity) = world.entity_mut(id) {
///     entity.add_component(Position::default());
///     entity.add_component(Velocity::default());
/// }
/// world.register_components(id);
///
/// world.on_update(0.016);
/// ```
pub struct WorldManager<E = ()> {
    /// All live entities.
    entities: EntityStore,
    /// Monotonic id source.
    ids: IdAllocator,
    /// Attached systems in registration order.
    systems: Vec<SystemSlot<E>>,
    /// World-global components (id -1).
    singletons: Entity,
    /// Structural changes queued by systems.
    commands: Commands,
    /// Outbound event callback.
    outlet: EventOutlet<E>,
    /// Configuration.
    config: WorldConfig,
    /// Completed `on_update` calls.
    frame: u64,
}

impl<E> Default for WorldManager<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> WorldManager<E> {
    /// Creates an empty world with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Creates an empty world.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            entities: EntityStore::new(),
            ids: IdAllocator::default(),
            systems: Vec::new(),
            singletons: Entity::new(EntityId::SINGLETON),
            commands: Commands::new(),
            outlet: EventOutlet::default(),
            config,
            frame: 0,
        }
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Number of completed `on_update` calls.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Wires the outbound event callback used by [`SystemContext::emit`].
    pub fn set_event_outlet(&mut self, sender: Sender<E>) {
        self.outlet = EventOutlet::new(sender);
    }

    /// Emits an event on the outbound callback.
    pub fn emit(&self, event: E) -> bool {
        self.outlet.emit(event)
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates an empty entity with the next id.
    ///
    /// The entity has no components, so it subscribes to nothing.
    pub fn create_entity(&mut self) -> EntityId {
        let id = self.ids.allocate();
        self.entities.insert(Entity::new(id));
        id
    }

    /// Inserts an entity under its own id, keeping the id counter ahead.
    ///
    /// Used by snapshot loading to preserve recorded ids.
    pub(crate) fn insert_entity(&mut self, entity: Entity) {
        self.ids.advance_past(entity.id());
        self.entities.insert(entity);
    }

    /// Keeps every id up to and including `id` out of future allocations.
    pub(crate) fn reserve_ids_through(&mut self, id: EntityId) {
        self.ids.advance_past(id);
    }

    /// Takes the next fresh id without creating an entity.
    pub(crate) fn allocate_id(&mut self) -> EntityId {
        self.ids.allocate()
    }

    /// Gets an entity by ID.
    #[inline]
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Gets a mutable entity by ID.
    ///
    /// Tag-set changes made here need [`register_components`](Self::register_components)
    /// or subscription re-validation to take effect.
    #[inline]
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// All live entities.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// Number of live entities (the singleton entity excluded).
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Destroys an entity and purges it from every subscriber table.
    ///
    /// No-op returning `None` if the entity does not exist.
    pub fn remove_entity_by_id(&mut self, id: EntityId) -> Option<Entity> {
        let removed = self.entities.remove(id)?;
        self.remove_entity_subscriptions(id);
        debug!(entity = %id, "entity removed");
        Some(removed)
    }

    /// Removes an entity id from every system's subscriber table.
    pub fn remove_entity_subscriptions(&mut self, id: EntityId) {
        for slot in &mut self.systems {
            slot.subscribers.remove(id);
        }
    }

    // =========================================================================
    // Singletons
    // =========================================================================

    /// Gets a singleton component.
    #[must_use]
    pub fn singleton<T: Component>(&self) -> Option<&T> {
        self.singletons.component::<T>()
    }

    /// Gets a singleton component mutably.
    pub fn singleton_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.singletons.component_mut::<T>()
    }

    /// Stores a singleton component, returning the one it replaced.
    pub fn add_singleton<T: Component>(&mut self, component: T) -> Option<T> {
        self.singletons.add_component(component)
    }

    /// Removes a singleton component.
    pub fn remove_singleton<T: Component>(&mut self) -> Option<T> {
        self.singletons.remove::<T>()
    }

    /// The singleton entity (id -1).
    #[inline]
    #[must_use]
    pub fn singletons(&self) -> &Entity {
        &self.singletons
    }

    /// The singleton entity, mutably.
    #[inline]
    pub fn singletons_mut(&mut self) -> &mut Entity {
        &mut self.singletons
    }

    // =========================================================================
    // Systems
    // =========================================================================

    /// Appends a system and calls its `on_attach` hook.
    ///
    /// Entities that already exist are not subscribed; call
    /// [`recalculate_all_subscribers`](Self::recalculate_all_subscribers)
    /// when adding systems to a populated world.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateSystem`] if a system with the same name
    /// is already attached.
    pub fn add_system<S: System<E> + 'static>(&mut self, system: S) -> EcsResult<()> {
        self.add_boxed_system(Box::new(system))
    }

    /// Appends a boxed system and calls its `on_attach` hook.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DuplicateSystem`] if a system with the same name
    /// is already attached.
    pub fn add_boxed_system(&mut self, system: Box<dyn System<E>>) -> EcsResult<()> {
        let name = system.name().to_string();
        if self.has_system(&name) {
            return Err(EcsError::DuplicateSystem(name));
        }

        let tuples = system.component_tuples();
        self.systems.push(SystemSlot {
            system,
            name,
            tuples,
            subscribers: SubscriberTable::new(),
        });

        let index = self.systems.len() - 1;
        let slot = &mut self.systems[index];
        let mut ctx = SystemContext::new(
            &mut self.singletons,
            Some(&mut self.entities),
            &mut self.ids,
            &mut self.commands,
            &self.outlet,
        );
        slot.system.on_attach(&mut ctx);
        info!(system = %slot.name, tuples = slot.tuples.len(), "system attached");

        self.apply_commands();
        Ok(())
    }

    /// Detaches the system with this name, calling `on_detach` first.
    ///
    /// Scans from the back. Returns `false` if no such system is attached.
    pub fn remove_system_by_name(&mut self, name: &str) -> bool {
        let Some(index) = self.systems.iter().rposition(|s| s.name == name) else {
            return false;
        };

        let slot = &mut self.systems[index];
        let mut ctx = SystemContext::new(
            &mut self.singletons,
            Some(&mut self.entities),
            &mut self.ids,
            &mut self.commands,
            &self.outlet,
        );
        slot.system.on_detach(&mut ctx);
        self.systems.remove(index);
        info!(system = name, "system detached");

        self.apply_commands();
        true
    }

    /// Checks if a system with this name is attached.
    #[must_use]
    pub fn has_system(&self, name: &str) -> bool {
        self.systems.iter().any(|s| s.name == name)
    }

    /// Names of attached systems in registration order.
    #[must_use]
    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name.as_str()).collect()
    }

    /// Number of attached systems.
    #[inline]
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Subscriber table of the named system.
    #[must_use]
    pub fn subscribers(&self, system: &str) -> Option<&SubscriberTable> {
        self.systems
            .iter()
            .find(|s| s.name == system)
            .map(|s| &s.subscribers)
    }

    /// Tuple index `entity` is subscribed with in the named system.
    #[must_use]
    pub fn subscription(&self, system: &str, entity: EntityId) -> Option<usize> {
        self.subscribers(system)?.get(entity)
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Subscribes an entity to every system whose tuples it satisfies.
    ///
    /// Systems where the entity is already subscribed are skipped, so calling
    /// this twice is the same as calling it once. Call after changing an
    /// entity's tag set.
    pub fn register_components(&mut self, id: EntityId) {
        let Some(entity) = self.entities.get(id) else {
            return;
        };

        for slot in &mut self.systems {
            if slot.subscribers.contains(id) {
                debug!(entity = %id, system = %slot.name, "already subscribed, skipping");
                continue;
            }
            if let Some(sub_index) = slot.first_match(entity) {
                slot.subscribers.insert(id, sub_index);
                debug!(entity = %id, system = %slot.name, sub_index, "subscribed");
            }
        }
    }

    /// Clears every subscriber table and registers every entity again.
    ///
    /// Expensive: O(entities × systems × tuples).
    pub fn recalculate_all_subscribers(&mut self) {
        for slot in &mut self.systems {
            slot.subscribers.clear();
        }
        for id in self.entities.ids() {
            self.register_components(id);
        }
        for entity in self.entities.iter_mut() {
            entity.mark_synced();
        }
        debug!(entities = self.entities.len(), "all subscribers recalculated");
    }

    /// Fully re-checks one entity against every system.
    ///
    /// Drops matches the entity no longer satisfies, corrects indices and
    /// adds new matches.
    pub(crate) fn sync_entity(&mut self, id: EntityId) {
        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };

        for slot in &mut self.systems {
            let current = slot.subscribers.get(id);
            match (current, slot.first_match(entity)) {
                (Some(old), Some(new)) if old != new => {
                    slot.subscribers.set_index(id, new);
                }
                (Some(_), None) => {
                    slot.subscribers.remove(id);
                    debug!(entity = %id, system = %slot.name, "stale subscription dropped");
                }
                (None, Some(new)) => {
                    slot.subscribers.insert(id, new);
                }
                _ => {}
            }
        }
        entity.mark_synced();
    }

    /// Re-validates every entity whose tag set changed.
    fn revalidate_changed_entities(&mut self) {
        let changed: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|e| e.components_changed())
            .map(Entity::id)
            .collect();

        for id in changed {
            self.sync_entity(id);
        }
    }

    /// Applies structural changes queued by systems.
    fn apply_commands(&mut self) {
        if self.commands.is_empty() {
            return;
        }

        let commands: Vec<Command> = self.commands.drain().collect();
        let mut touched: Vec<EntityId> = Vec::new();
        let mut seen: HashSet<EntityId> = HashSet::new();
        let mut recalculate = false;

        for command in commands {
            match command {
                Command::Spawn(id) => {
                    self.entities.insert(Entity::new(id));
                    if seen.insert(id) {
                        touched.push(id);
                    }
                }
                Command::Despawn(id) => {
                    self.remove_entity_by_id(id);
                }
                Command::Insert { entity, component } => match self.entities.get_mut(entity) {
                    Some(target) => {
                        target.add_boxed(component);
                        if seen.insert(entity) {
                            touched.push(entity);
                        }
                    }
                    None => debug!(entity = %entity, "insert on missing entity ignored"),
                },
                Command::Remove { entity, tag } => {
                    if let Some(target) = self.entities.get_mut(entity) {
                        target.remove_component(tag);
                        if seen.insert(entity) {
                            touched.push(entity);
                        }
                    }
                }
                Command::RecalculateAll => recalculate = true,
            }
        }

        if recalculate {
            self.recalculate_all_subscribers();
        } else {
            for id in touched {
                self.sync_entity(id);
            }
        }
    }

    // =========================================================================
    // Frame protocol
    // =========================================================================

    /// Runs one frame.
    ///
    /// 1. `begin_update(dt)` on every system
    /// 2. `on_entity_update(dt, entity, idx)` for every subscription, in
    ///    subscriber-table insertion order
    /// 3. `end_update(dt)` on every system
    ///
    /// Systems run in registration order. With [`UpdateOrder::PerSystem`]
    /// each system completes all three phases before the next starts; with
    /// [`UpdateOrder::Phased`] each phase runs across all systems first.
    /// Queued structural changes are applied after every phase of every
    /// system.
    pub fn on_update(&mut self, dt: f32) {
        if self.config.revalidate_subscriptions {
            self.revalidate_changed_entities();
        }

        match self.config.update_order {
            UpdateOrder::PerSystem => {
                for index in 0..self.systems.len() {
                    self.run_begin(index, dt);
                    self.run_entities(index, dt);
                    self.run_end(index, dt);
                }
            }
            UpdateOrder::Phased => {
                for index in 0..self.systems.len() {
                    self.run_begin(index, dt);
                }
                for index in 0..self.systems.len() {
                    self.run_entities(index, dt);
                }
                for index in 0..self.systems.len() {
                    self.run_end(index, dt);
                }
            }
        }

        self.frame += 1;
    }

    fn run_begin(&mut self, index: usize, dt: f32) {
        let Some(slot) = self.systems.get_mut(index) else {
            return;
        };
        let mut ctx = SystemContext::new(
            &mut self.singletons,
            Some(&mut self.entities),
            &mut self.ids,
            &mut self.commands,
            &self.outlet,
        );
        slot.system.begin_update(dt, &mut ctx);
        self.apply_commands();
    }

    fn run_entities(&mut self, index: usize, dt: f32) {
        let Some(slot) = self.systems.get_mut(index) else {
            return;
        };
        let SystemSlot {
            system,
            subscribers,
            ..
        } = slot;

        // Commands are deferred, so the table cannot change mid-iteration.
        for sub in subscribers.iter() {
            let Some(entity) = self.entities.get_mut(sub.entity) else {
                continue;
            };
            let mut ctx = SystemContext::new(
                &mut self.singletons,
                None,
                &mut self.ids,
                &mut self.commands,
                &self.outlet,
            );
            system.on_entity_update(dt, entity, sub.sub_index, &mut ctx);
        }
        self.apply_commands();
    }

    fn run_end(&mut self, index: usize, dt: f32) {
        let Some(slot) = self.systems.get_mut(index) else {
            return;
        };
        let mut ctx = SystemContext::new(
            &mut self.singletons,
            Some(&mut self.entities),
            &mut self.ids,
            &mut self.commands,
            &self.outlet,
        );
        slot.system.end_update(dt, &mut ctx);
        self.apply_commands();
    }

    /// Fans an application event out to every system in registration order.
    pub fn on_event(&mut self, event: &E) {
        for slot in &mut self.systems {
            let mut ctx = SystemContext::new(
                &mut self.singletons,
                Some(&mut self.entities),
                &mut self.ids,
                &mut self.commands,
                &self.outlet,
            );
            slot.system.on_event(event, &mut ctx);
        }
        self.apply_commands();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Pos {
        x: f32,
    }

    impl Component for Pos {
        const TAG: &'static str = "Pos";
    }

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Vel {
        x: f32,
    }

    impl Component for Vel {
        const TAG: &'static str = "Vel";
    }

    struct Movement;

    impl System for Movement {
        fn name(&self) -> &str {
            "movement"
        }

        fn component_tuples(&self) -> Vec<ComponentTuple> {
            vec![ComponentTuple::of(&[Pos::TAG, Vel::TAG])]
        }

        fn on_entity_update(
            &mut self,
            dt: f32,
            entity: &mut Entity,
            _sub_index: usize,
            _ctx: &mut SystemContext<'_, ()>,
        ) {
            let Some(vx) = entity.component::<Vel>().map(|v| v.x) else {
                return;
            };
            if let Some(pos) = entity.component_mut::<Pos>() {
                pos.x += vx * dt;
            }
        }
    }

    /// Spawns one entity per frame carrying only `Pos`.
    struct Spawner;

    impl System for Spawner {
        fn name(&self) -> &str {
            "spawner"
        }

        fn component_tuples(&self) -> Vec<ComponentTuple> {
            Vec::new()
        }

        fn begin_update(&mut self, _dt: f32, ctx: &mut SystemContext<'_, ()>) {
            let id = ctx.spawn();
            ctx.insert(id, Pos::default());
        }
    }

    /// Despawns every entity it visits.
    struct Reaper;

    impl System for Reaper {
        fn name(&self) -> &str {
            "reaper"
        }

        fn component_tuples(&self) -> Vec<ComponentTuple> {
            vec![ComponentTuple::of(&[Pos::TAG])]
        }

        fn on_entity_update(
            &mut self,
            _dt: f32,
            entity: &mut Entity,
            _sub_index: usize,
            ctx: &mut SystemContext<'_, ()>,
        ) {
            ctx.despawn(entity.id());
        }
    }

    fn moving_entity(world: &mut WorldManager) -> EntityId {
        let id = world.create_entity();
        if let Some(entity) = world.entity_mut(id) {
            entity.add_component(Pos { x: 0.0 });
            entity.add_component(Vel { x: 2.0 });
        }
        world.register_components(id);
        id
    }

    #[test]
    fn test_entity_ids_monotonic() {
        let mut world: WorldManager = WorldManager::new();
        let a = world.create_entity();
        let b = world.create_entity();
        world.remove_entity_by_id(b);
        let c = world.create_entity();

        assert_eq!(a.raw(), 0);
        assert_eq!(b.raw(), 1);
        assert_eq!(c.raw(), 2);
    }

    #[test]
    fn test_update_moves_entity() {
        let mut world: WorldManager = WorldManager::new();
        world.add_system(Movement).unwrap();
        let id = moving_entity(&mut world);

        world.on_update(0.5);

        let pos = world.entity(id).and_then(|e| e.component::<Pos>()).unwrap();
        assert!((pos.x - 1.0).abs() < f32::EPSILON);
        assert_eq!(world.frame(), 1);
    }

    #[test]
    fn test_duplicate_system_rejected() {
        let mut world: WorldManager = WorldManager::new();
        world.add_system(Movement).unwrap();
        assert!(matches!(
            world.add_system(Movement),
            Err(EcsError::DuplicateSystem(_))
        ));
        assert_eq!(world.system_count(), 1);
    }

    #[test]
    fn test_remove_system() {
        let mut world: WorldManager = WorldManager::new();
        world.add_system(Movement).unwrap();
        assert!(!world.remove_system_by_name("missing"));
        assert!(world.remove_system_by_name("movement"));
        assert!(world.system_names().is_empty());
    }

    #[test]
    fn test_commands_spawn_after_phase() {
        let mut world: WorldManager = WorldManager::new();
        world.add_system(Spawner).unwrap();
        world.add_system(Reaper).unwrap();

        world.on_update(0.016);
        // Spawned in begin phase, applied and registered before the reaper ran
        assert_eq!(world.entity_count(), 0);
        assert!(world.subscribers("reaper").unwrap().is_empty());

        // Id of the despawned entity is not reused
        assert_eq!(world.create_entity().raw(), 1);
    }

    #[test]
    fn test_revalidation_drops_stale_match() {
        let mut world: WorldManager = WorldManager::new();
        world.add_system(Movement).unwrap();
        let id = moving_entity(&mut world);
        assert_eq!(world.subscription("movement", id), Some(0));

        if let Some(entity) = world.entity_mut(id) {
            entity.remove::<Vel>();
        }
        world.on_update(0.016);
        assert_eq!(world.subscription("movement", id), None);
    }

    #[test]
    fn test_stale_match_kept_without_revalidation() {
        let config = WorldConfig {
            revalidate_subscriptions: false,
            ..WorldConfig::default()
        };
        let mut world: WorldManager = WorldManager::with_config(config);
        world.add_system(Movement).unwrap();
        let id = moving_entity(&mut world);

        if let Some(entity) = world.entity_mut(id) {
            entity.remove::<Vel>();
        }
        world.on_update(0.016);
        assert_eq!(world.subscription("movement", id), Some(0));
    }
}
