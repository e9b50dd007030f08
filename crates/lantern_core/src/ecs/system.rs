//! # Systems
//!
//! A system is a unit of per-frame behavior. It declares which component
//! tuples it reacts to, and the world calls it in three phases each frame:
//!
//! ```text
//! begin_update(dt)                      once, before any entity
//! on_entity_update(dt, entity, idx)     once per subscribed entity
//! end_update(dt)                        once, after every entity
//! ```
//!
//! Systems never touch the world directly. Every hook receives a
//! [`SystemContext`] giving access to singletons, the outbound event outlet
//! and a command queue. Structural changes (spawn, despawn, adding or removing
//! components on other entities) are queued and applied once the current phase
//! completes, so subscriber tables never change under iteration.

use crossbeam_channel::{Sender, TrySendError};
use tracing::warn;

use super::component::{AnyComponent, Component, ComponentTuple};
use super::entity::{Entity, EntityId, EntityStore, IdAllocator};

/// Behavior contract for a system.
///
/// `E` is the application-defined event type fanned out by
/// [`WorldManager::on_event`](crate::WorldManager::on_event).
///
/// Hooks are expected not to panic. A system that needs a missing singleton
/// should log the misconfiguration and skip its work.
pub trait System<E = ()> {
    /// Stable unique name, used for registry lookup and removal.
    fn name(&self) -> &str;

    /// Ordered component tuples this system reacts to.
    ///
    /// An entity is subscribed with the index of the FIRST tuple it fully
    /// satisfies. An empty list means the system only runs its begin/end
    /// phases. Must be pure: the world reads it once, on attach.
    fn component_tuples(&self) -> Vec<ComponentTuple>;

    /// Called once when the system is added to a world.
    fn on_attach(&mut self, _ctx: &mut SystemContext<'_, E>) {}

    /// Called once before the system is removed from a world.
    fn on_detach(&mut self, _ctx: &mut SystemContext<'_, E>) {}

    /// Called once per frame before the per-entity phase.
    fn begin_update(&mut self, _dt: f32, _ctx: &mut SystemContext<'_, E>) {}

    /// Called once per subscribed entity per frame.
    ///
    /// `sub_index` is the index of the tuple the entity matched.
    fn on_entity_update(
        &mut self,
        _dt: f32,
        _entity: &mut Entity,
        _sub_index: usize,
        _ctx: &mut SystemContext<'_, E>,
    ) {
    }

    /// Called once per frame after the per-entity phase.
    fn end_update(&mut self, _dt: f32, _ctx: &mut SystemContext<'_, E>) {}

    /// Called for every event passed to the world's `on_event`.
    fn on_event(&mut self, _event: &E, _ctx: &mut SystemContext<'_, E>) {}
}

/// A structural change queued by a system.
#[derive(Debug)]
pub enum Command {
    /// Create an entity with a pre-reserved id.
    Spawn(EntityId),
    /// Destroy an entity.
    Despawn(EntityId),
    /// Attach a component to an entity.
    Insert {
        /// Target entity.
        entity: EntityId,
        /// Component to attach.
        component: Box<dyn AnyComponent>,
    },
    /// Detach a component from an entity.
    Remove {
        /// Target entity.
        entity: EntityId,
        /// Tag of the component to detach.
        tag: &'static str,
    },
    /// Rebuild every subscriber table.
    RecalculateAll,
}

/// Queue of structural changes, applied after the current phase.
#[derive(Debug, Default)]
pub struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued commands.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Checks if nothing is queued.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queues a raw command.
    pub fn push(&mut self, command: Command) {
        self.queue.push(command);
    }

    /// Takes every queued command, leaving the queue empty.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Command> {
        self.queue.drain(..)
    }
}

/// Outbound event callback shared by the world and its systems.
///
/// Events go to a bounded crossbeam channel owned by the embedding
/// application. With no channel wired, events are discarded.
#[derive(Debug)]
pub struct EventOutlet<E> {
    sender: Option<Sender<E>>,
}

impl<E> Default for EventOutlet<E> {
    fn default() -> Self {
        Self { sender: None }
    }
}

impl<E> EventOutlet<E> {
    /// Creates an outlet feeding `sender`.
    #[must_use]
    pub fn new(sender: Sender<E>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Checks if a channel is wired.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.sender.is_some()
    }

    /// Sends an event (non-blocking).
    ///
    /// Returns `false` if no channel is wired, the channel is full, or the
    /// receiver is gone.
    pub fn emit(&self, event: E) -> bool {
        let Some(sender) = &self.sender else {
            return false;
        };
        match sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("outbound event channel full, dropping event");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("outbound event receiver dropped");
                false
            }
        }
    }
}

/// Everything a system may touch during a hook.
///
/// Built fresh by the world for every call.
pub struct SystemContext<'a, E> {
    singletons: &'a mut Entity,
    entities: Option<&'a mut EntityStore>,
    ids: &'a mut IdAllocator,
    commands: &'a mut Commands,
    outlet: &'a EventOutlet<E>,
}

impl<'a, E> SystemContext<'a, E> {
    pub(crate) fn new(
        singletons: &'a mut Entity,
        entities: Option<&'a mut EntityStore>,
        ids: &'a mut IdAllocator,
        commands: &'a mut Commands,
        outlet: &'a EventOutlet<E>,
    ) -> Self {
        Self {
            singletons,
            entities,
            ids,
            commands,
            outlet,
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

    /// The singleton entity.
    #[must_use]
    pub fn singletons(&self) -> &Entity {
        self.singletons
    }

    // =========================================================================
    // Entities (begin/end/event/attach hooks only)
    // =========================================================================

    /// Read access to every entity.
    ///
    /// `None` during the per-entity phase, where only the current entity is
    /// reachable.
    #[must_use]
    pub fn entities(&self) -> Option<&EntityStore> {
        self.entities.as_deref()
    }

    /// Write access to every entity's component values.
    ///
    /// Tag-set changes made through this handle are picked up by
    /// subscription re-validation before the next update.
    pub fn entities_mut(&mut self) -> Option<&mut EntityStore> {
        self.entities.as_deref_mut()
    }

    // =========================================================================
    // Deferred structural changes
    // =========================================================================

    /// Reserves an id and queues creation of an empty entity.
    ///
    /// The entity exists once the current phase completes.
    pub fn spawn(&mut self) -> EntityId {
        let id = self.ids.allocate();
        self.commands.push(Command::Spawn(id));
        id
    }

    /// Queues destruction of an entity.
    pub fn despawn(&mut self, entity: EntityId) {
        self.commands.push(Command::Despawn(entity));
    }

    /// Queues attaching a component to an entity.
    pub fn insert<T: Component>(&mut self, entity: EntityId, component: T) {
        self.commands.push(Command::Insert {
            entity,
            component: Box::new(component),
        });
    }

    /// Queues detaching a component from an entity.
    pub fn remove<T: Component>(&mut self, entity: EntityId) {
        self.commands.push(Command::Remove {
            entity,
            tag: T::TAG,
        });
    }

    /// Queues a full subscriber rebuild.
    pub fn recalculate_all(&mut self) {
        self.commands.push(Command::RecalculateAll);
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Emits an event to the application.
    pub fn emit(&self, event: E) -> bool {
        self.outlet.emit(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn test_outlet_without_channel() {
        let outlet: EventOutlet<u32> = EventOutlet::default();
        assert!(!outlet.is_connected());
        assert!(!outlet.emit(1));
    }

    #[test]
    fn test_outlet_full_channel() {
        let (tx, rx) = bounded(1);
        let outlet = EventOutlet::new(tx);
        assert!(outlet.emit(1u32));
        assert!(!outlet.emit(2u32));
        assert_eq!(rx.try_recv().ok(), Some(1));
    }

    #[test]
    fn test_context_spawn_reserves_ids() {
        let mut singletons = Entity::new(EntityId::SINGLETON);
        let mut ids = IdAllocator::default();
        let mut commands = Commands::new();
        let outlet: EventOutlet<()> = EventOutlet::default();

        let mut ctx = SystemContext::new(&mut singletons, None, &mut ids, &mut commands, &outlet);
        let a = ctx.spawn();
        let b = ctx.spawn();
        ctx.despawn(a);
        assert!(ctx.entities().is_none());

        assert_ne!(a, b);
        assert_eq!(commands.len(), 3);
        assert_eq!(ids.peek(), EntityId::new(2));
    }
}
