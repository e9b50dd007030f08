//! # Built-in Components
//!
//! Plain 2D data every game needs. Tags are the snapshot `type` values.

use lantern_core::Component;
use serde::{Deserialize, Serialize};

/// World-space placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
    /// Rotation in radians.
    pub rotation: f32,
    /// Uniform scale.
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale: 1.0,
        }
    }
}

impl Transform {
    /// Creates a transform at a position.
    #[inline]
    #[must_use]
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }
}

impl Component for Transform {
    const TAG: &'static str = "Transform";
}

/// Linear and angular velocity, per second.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Velocity {
    /// Horizontal speed.
    pub x: f32,
    /// Vertical speed.
    pub y: f32,
    /// Angular speed in radians.
    pub angular: f32,
}

impl Velocity {
    /// Creates a linear velocity.
    #[inline]
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, angular: 0.0 }
    }
}

impl Component for Velocity {
    const TAG: &'static str = "Velocity";
}

/// Opaque handle into the host's texture store.
///
/// Only valid for the lifetime of the host; never saved in snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// A textured quad.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sprite {
    /// Texture asset key.
    pub texture: String,
    /// Width in world units.
    pub width: f32,
    /// Height in world units.
    pub height: f32,
    /// RGBA multiplier.
    pub tint: [u8; 4],
    /// Draw order; higher layers draw on top.
    pub layer: i32,
    /// Hidden sprites are skipped.
    pub visible: bool,
    /// Resolved texture, filled in by the host.
    #[serde(skip)]
    pub handle: Option<TextureHandle>,
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            texture: String::new(),
            width: 1.0,
            height: 1.0,
            tint: [255; 4],
            layer: 0,
            visible: true,
            handle: None,
        }
    }
}

impl Sprite {
    /// Creates a visible sprite for a texture key.
    #[must_use]
    pub fn new(texture: impl Into<String>, width: f32, height: f32) -> Self {
        Self {
            texture: texture.into(),
            width,
            height,
            ..Self::default()
        }
    }
}

impl Component for Sprite {
    const TAG: &'static str = "Sprite";
}

/// The view onto the world. Stored as a singleton.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// Center, horizontal.
    pub x: f32,
    /// Center, vertical.
    pub y: f32,
    /// Screen pixels per world unit.
    pub zoom: f32,
    /// Viewport width in pixels.
    pub viewport_width: u32,
    /// Viewport height in pixels.
    pub viewport_height: u32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
            viewport_width: 1280,
            viewport_height: 720,
        }
    }
}

impl Camera {
    /// Smallest allowed zoom.
    pub const MIN_ZOOM: f32 = 0.05;
    /// Largest allowed zoom.
    pub const MAX_ZOOM: f32 = 64.0;

    /// Maps a world position to viewport pixels.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn world_to_screen(&self, x: f32, y: f32) -> (f32, f32) {
        let half_w = self.viewport_width as f32 * 0.5;
        let half_h = self.viewport_height as f32 * 0.5;
        (
            (x - self.x) * self.zoom + half_w,
            (y - self.y) * self.zoom + half_h,
        )
    }
}

impl Component for Camera {
    const TAG: &'static str = "Camera";
}
