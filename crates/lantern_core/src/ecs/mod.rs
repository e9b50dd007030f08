//! # Entity Component System
//!
//! ## Design Philosophy
//!
//! - Entities are bags of components addressed by stable, never-reused ids
//! - Systems declare component tuples; the world routes matching entities
//! - Each frame runs begin, per-entity and end phases per system
//! - Structural changes from inside systems are deferred to phase boundaries

mod component;
mod entity;
mod subscribers;
mod system;
mod world;

pub use component::{AnyComponent, Component, ComponentRecord, ComponentTuple};
pub use entity::{Entity, EntityId, EntityStore, IdAllocator};
pub use subscribers::{SubscriberTable, Subscription};
pub use system::{Command, Commands, EventOutlet, System, SystemContext};
pub use world::WorldManager;
