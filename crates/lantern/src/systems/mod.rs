//! # Built-in Systems
//!
//! - `movement`: integrates `Velocity` into `Transform`
//! - `camera_controller`: owns the `Camera` singleton, reacts to input
//! - `sprite_render`: submits sprites to a [`DrawSink`]

mod camera;
mod movement;
mod sprite_render;

pub use camera::CameraControllerSystem;
pub use movement::MovementSystem;
pub use sprite_render::{DrawCommand, DrawSink, NullSink, RecordingSink, SpriteRenderSystem};
