//! # Lantern
//!
//! The runtime around the Lantern ECS: configuration, the frame loop, the
//! event channels to the host application, and the built-in 2D components
//! and systems.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ Host (browser page, native shell, headless runner)               │
//! │   input ──> EventSender          EventReceiver ──> UI / audio    │
//! │                 │                      ▲                         │
//! │ ┌───────────────▼──────────────────────┴───────────────────────┐ │
//! │ │ GameLoop                                                     │ │
//! │ │   WorldManager<EngineEvent>                                  │ │
//! │ │     movement ─ camera_controller ─ sprite_render ──> DrawSink│ │
//! │ └──────────────────────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: TOML engine configuration
//! - `events`: event bus between host and systems
//! - `game_loop`: frame orchestration and timing
//! - `components` / `systems`: built-in 2D content
//! - `builtins`: registries for snapshot loading

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod builtins;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod game_loop;
pub mod systems;

// Re-export the runtime
pub use lantern_core as core;

pub use builtins::{builtin_catalog, builtin_registry, builtin_registry_with_sink};
pub use components::{Camera, Sprite, TextureHandle, Transform, Velocity};
pub use config::{EngineConfig, FrameConfig, LogConfig};
pub use error::{EngineError, EngineResult};
pub use events::{EngineEvent, EventBus, EventReceiver, EventSender};
pub use game_loop::{FrameStats, FrameStatsAccumulator, GameLoop};
pub use systems::{
    CameraControllerSystem, DrawCommand, DrawSink, MovementSystem, NullSink, RecordingSink,
    SpriteRenderSystem,
};

use std::path::Path;

use lantern_core::WorldSnapshot;
use tracing::info;

/// Reads a snapshot from a JSON file.
///
/// # Errors
///
/// Returns [`EngineError::Io`] if the file cannot be read, or
/// [`EngineError::Ecs`] if it is not a snapshot.
pub fn read_snapshot(path: impl AsRef<Path>) -> EngineResult<WorldSnapshot> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)?;
    let snapshot = WorldSnapshot::from_json(&json)?;
    info!(
        path = %path.display(),
        entities = snapshot.entities.len(),
        "snapshot read"
    );
    Ok(snapshot)
}

/// Writes a snapshot as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`EngineError::Ecs`] if encoding fails or [`EngineError::Io`] if
/// the file cannot be written.
pub fn write_snapshot(path: impl AsRef<Path>, snapshot: &WorldSnapshot) -> EngineResult<()> {
    let path = path.as_ref();
    std::fs::write(path, snapshot.to_json()?)?;
    info!(path = %path.display(), "snapshot written");
    Ok(())
}
