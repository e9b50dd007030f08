//! # Sprite Rendering
//!
//! Turns `Transform + Sprite` entities into screen-space draw commands and
//! hands them to a [`DrawSink`]. The sink is whatever the host renders with;
//! this crate never touches a GPU.
//!
//! ## Tuples
//!
//! | Index | Requires              | Draws                 |
//! |-------|-----------------------|-----------------------|
//! | 0     | `Transform`, `Sprite` | the sprite            |
//! | 1     | `Transform`           | a debug marker        |
//!
//! Commands are buffered during the frame and submitted in `end_update`,
//! sorted by layer (stable, so equal layers keep subscription order).

use std::cell::RefCell;
use std::rc::Rc;

use lantern_core::{Component, ComponentTuple, Entity, EntityId, System, SystemContext};
use tracing::warn;

use crate::components::{Camera, Sprite, TextureHandle, Transform};
use crate::events::EngineEvent;

/// One screen-space draw.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    /// A textured quad.
    Sprite {
        /// Source entity.
        entity: EntityId,
        /// Texture asset key.
        texture: String,
        /// Resolved texture, if the host filled it in.
        handle: Option<TextureHandle>,
        /// Center in viewport pixels.
        x: f32,
        /// Center in viewport pixels.
        y: f32,
        /// Size in viewport pixels.
        width: f32,
        /// Size in viewport pixels.
        height: f32,
        /// Rotation in radians.
        rotation: f32,
        /// RGBA multiplier.
        tint: [u8; 4],
        /// Draw order.
        layer: i32,
    },
    /// A small marker for placed entities without a sprite.
    Marker {
        /// Source entity.
        entity: EntityId,
        /// Position in viewport pixels.
        x: f32,
        /// Position in viewport pixels.
        y: f32,
    },
}

impl DrawCommand {
    /// Sort key. Markers draw above every sprite.
    fn layer(&self) -> i32 {
        match self {
            Self::Sprite { layer, .. } => *layer,
            Self::Marker { .. } => i32::MAX,
        }
    }
}

/// Receiver of a frame's draw commands.
pub trait DrawSink {
    /// Called before the first command of a frame.
    fn begin_frame(&mut self, _camera: &Camera) {}

    /// Draws one command.
    fn draw(&mut self, command: &DrawCommand);

    /// Called after the last command of a frame.
    fn end_frame(&mut self) {}
}

/// Sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl DrawSink for NullSink {
    fn draw(&mut self, _command: &DrawCommand) {}
}

/// Sink that keeps every frame's commands, for tests and headless runs.
///
/// Clones share one recording, so a clone kept by the caller observes what
/// the render system drew.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    frames: Rc<RefCell<Vec<Vec<DrawCommand>>>>,
}

impl RecordingSink {
    /// Creates an empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed or started frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Commands of the most recent frame.
    #[must_use]
    pub fn last_frame(&self) -> Vec<DrawCommand> {
        self.frames.borrow().last().cloned().unwrap_or_default()
    }

    /// Every recorded frame.
    #[must_use]
    pub fn frames(&self) -> Vec<Vec<DrawCommand>> {
        self.frames.borrow().clone()
    }
}

impl DrawSink for RecordingSink {
    fn begin_frame(&mut self, _camera: &Camera) {
        self.frames.borrow_mut().push(Vec::new());
    }

    fn draw(&mut self, command: &DrawCommand) {
        if let Some(frame) = self.frames.borrow_mut().last_mut() {
            frame.push(command.clone());
        }
    }
}

/// Submits visible sprites to a draw sink every frame.
pub struct SpriteRenderSystem {
    sink: Box<dyn DrawSink>,
    /// Camera captured at the start of the frame.
    camera: Camera,
    /// Commands collected this frame.
    pending: Vec<DrawCommand>,
    /// Emit markers for sprite-less entities.
    pub show_markers: bool,
    warned_no_camera: bool,
}

impl std::fmt::Debug for SpriteRenderSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpriteRenderSystem")
            .field("pending", &self.pending.len())
            .field("show_markers", &self.show_markers)
            .finish_non_exhaustive()
    }
}

impl Default for SpriteRenderSystem {
    fn default() -> Self {
        Self::new(Box::new(NullSink))
    }
}

impl SpriteRenderSystem {
    /// Registry name.
    pub const NAME: &'static str = "sprite_render";

    /// Creates a render system drawing into `sink`.
    #[must_use]
    pub fn new(sink: Box<dyn DrawSink>) -> Self {
        Self {
            sink,
            camera: Camera::default(),
            pending: Vec::with_capacity(256),
            show_markers: true,
            warned_no_camera: false,
        }
    }

    fn sprite_command(&self, entity: EntityId, transform: &Transform, sprite: &Sprite) -> DrawCommand {
        let (x, y) = self.camera.world_to_screen(transform.x, transform.y);
        let scale = transform.scale * self.camera.zoom;
        DrawCommand::Sprite {
            entity,
            texture: sprite.texture.clone(),
            handle: sprite.handle,
            x,
            y,
            width: sprite.width * scale,
            height: sprite.height * scale,
            rotation: transform.rotation,
            tint: sprite.tint,
            layer: sprite.layer,
        }
    }
}

impl System<EngineEvent> for SpriteRenderSystem {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn component_tuples(&self) -> Vec<ComponentTuple> {
        vec![
            ComponentTuple::of(&[Transform::TAG, Sprite::TAG]),
            ComponentTuple::of(&[Transform::TAG]),
        ]
    }

    fn begin_update(&mut self, _dt: f32, ctx: &mut SystemContext<'_, EngineEvent>) {
        self.pending.clear();
        match ctx.singleton::<Camera>() {
            Some(camera) => self.camera = camera.clone(),
            None => {
                if !self.warned_no_camera {
                    warn!("no camera singleton, rendering with the default view");
                    self.warned_no_camera = true;
                }
                self.camera = Camera::default();
            }
        }
        self.sink.begin_frame(&self.camera);
    }

    fn on_entity_update(
        &mut self,
        _dt: f32,
        entity: &mut Entity,
        sub_index: usize,
        _ctx: &mut SystemContext<'_, EngineEvent>,
    ) {
        let Some(transform) = entity.component::<Transform>() else {
            return;
        };

        let command = match (sub_index, entity.component::<Sprite>()) {
            (0, Some(sprite)) if sprite.visible => {
                self.sprite_command(entity.id(), transform, sprite)
            }
            (0, _) => return,
            _ if self.show_markers => {
                let (x, y) = self.camera.world_to_screen(transform.x, transform.y);
                DrawCommand::Marker {
                    entity: entity.id(),
                    x,
                    y,
                }
            }
            _ => return,
        };
        self.pending.push(command);
    }

    fn end_update(&mut self, _dt: f32, _ctx: &mut SystemContext<'_, EngineEvent>) {
        self.pending.sort_by_key(DrawCommand::layer);
        for command in &self.pending {
            self.sink.draw(command);
        }
        self.sink.end_frame();
    }
}
