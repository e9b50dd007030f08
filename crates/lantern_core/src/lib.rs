//! # Lantern Core
//!
//! The Entity Component System runtime of the Lantern 2D engine:
//! - Entities with stable, never-reused ids and typed components
//! - Systems subscribed to entities through declared component tuples
//! - A deterministic begin / per-entity / end frame protocol
//! - Snapshot export and import of a whole live world
//!
//! Rendering, physics and input live outside this crate. Systems reach them
//! through whatever handles the embedding application gives them; components
//! may hold such handles.
//!
//! ## Example
//!
//! ```rust,ignore
//! use lantern_core::{ComponentCatalog, SystemRegistry, WorldConfig, WorldManager, WorldSnapshot};
//!
//! let snapshot = WorldSnapshot::from_json(&json)?;
//! let world: WorldManager = WorldManager::from_snapshot(
//!     &snapshot,
//!     &mut registry,
//!     &catalog,
//!     WorldConfig::default(),
//! )?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;
pub mod snapshot;

pub use config::{UnknownComponentPolicy, UpdateOrder, WorldConfig};
pub use ecs::{
    AnyComponent, Command, Commands, Component, ComponentRecord, ComponentTuple, Entity,
    EntityId, EntityStore, EventOutlet, IdAllocator, SubscriberTable, Subscription, System,
    SystemContext, WorldManager,
};
pub use error::{EcsError, EcsResult};
pub use snapshot::{ComponentCatalog, EntityTemplate, SystemFactory, SystemRegistry, WorldSnapshot};
