//! # Camera Controller
//!
//! Owns the [`Camera`] singleton. Subscribes to no entities; all of its work
//! happens in `on_event` and `begin_update`.
//!
//! - `CameraPan` / `CameraZoom` events move the camera immediately
//! - Held arrow keys pan continuously, scaled by zoom
//! - `Resized` updates the viewport
//!
//! Every change is reported outward as `CameraMoved`.

use lantern_core::{ComponentTuple, System, SystemContext};
use tracing::{debug, warn};

use crate::components::Camera;
use crate::events::EngineEvent;

/// Arrow key codes, in `held` order.
const PAN_KEYS: [&str; 4] = ["ArrowLeft", "ArrowRight", "ArrowUp", "ArrowDown"];

/// Drives the camera singleton from input events.
#[derive(Clone, Debug)]
pub struct CameraControllerSystem {
    /// Keyboard pan speed in screen pixels per second.
    pub pan_speed: f32,
    /// Which of `PAN_KEYS` are held.
    held: [bool; 4],
}

impl Default for CameraControllerSystem {
    fn default() -> Self {
        Self {
            pan_speed: 400.0,
            held: [false; 4],
        }
    }
}

impl CameraControllerSystem {
    /// Registry name.
    pub const NAME: &'static str = "camera_controller";

    /// Creates a controller with a keyboard pan speed.
    #[must_use]
    pub fn with_pan_speed(pan_speed: f32) -> Self {
        Self {
            pan_speed,
            ..Self::default()
        }
    }

    fn key_direction(&self) -> (f32, f32) {
        let axis = |neg: bool, pos: bool| f32::from(u8::from(pos)) - f32::from(u8::from(neg));
        (
            axis(self.held[0], self.held[1]),
            axis(self.held[3], self.held[2]),
        )
    }

    /// Applies `change` to the camera and reports the result.
    fn update_camera(
        ctx: &mut SystemContext<'_, EngineEvent>,
        change: impl FnOnce(&mut Camera),
    ) {
        let Some(camera) = ctx.singleton_mut::<Camera>() else {
            warn!("camera singleton missing, event ignored");
            return;
        };
        change(camera);
        let moved = EngineEvent::CameraMoved {
            x: camera.x,
            y: camera.y,
            zoom: camera.zoom,
        };
        ctx.emit(moved);
    }
}

impl System<EngineEvent> for CameraControllerSystem {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn component_tuples(&self) -> Vec<ComponentTuple> {
        Vec::new()
    }

    fn on_attach(&mut self, ctx: &mut SystemContext<'_, EngineEvent>) {
        if ctx.singleton::<Camera>().is_none() {
            ctx.add_singleton(Camera::default());
            debug!("default camera installed");
        }
    }

    fn begin_update(&mut self, dt: f32, ctx: &mut SystemContext<'_, EngineEvent>) {
        let (dx, dy) = self.key_direction();
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        let speed = self.pan_speed;
        Self::update_camera(ctx, |camera| {
            let step = speed * dt / camera.zoom;
            camera.x += dx * step;
            camera.y += dy * step;
        });
    }

    fn on_event(&mut self, event: &EngineEvent, ctx: &mut SystemContext<'_, EngineEvent>) {
        match event {
            EngineEvent::CameraPan { dx, dy } => {
                let (dx, dy) = (*dx, *dy);
                Self::update_camera(ctx, |camera| {
                    camera.x += dx;
                    camera.y += dy;
                });
            }
            EngineEvent::CameraZoom { factor } => {
                let factor = *factor;
                if !factor.is_finite() || factor <= 0.0 {
                    warn!(factor, "ignoring non-positive zoom factor");
                    return;
                }
                Self::update_camera(ctx, |camera| {
                    camera.zoom = (camera.zoom * factor).clamp(Camera::MIN_ZOOM, Camera::MAX_ZOOM);
                });
            }
            EngineEvent::Resized { width, height } => {
                let (width, height) = (*width, *height);
                Self::update_camera(ctx, |camera| {
                    camera.viewport_width = width;
                    camera.viewport_height = height;
                });
            }
            EngineEvent::Key { code, pressed } => {
                if let Some(slot) = PAN_KEYS.iter().position(|k| k == code) {
                    self.held[slot] = *pressed;
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use lantern_core::WorldManager;

    fn world() -> WorldManager<EngineEvent> {
        let mut world = WorldManager::new();
        world.add_system(CameraControllerSystem::default()).unwrap();
        world
    }

    #[test]
    fn test_installs_camera_on_attach() {
        let world = world();
        assert_eq!(world.singleton::<Camera>(), Some(&Camera::default()));
    }

    #[test]
    fn test_keeps_existing_camera() {
        let mut world: WorldManager<EngineEvent> = WorldManager::new();
        world.add_singleton(Camera {
            zoom: 3.0,
            ..Camera::default()
        });
        world.add_system(CameraControllerSystem::default()).unwrap();
        assert!((world.singleton::<Camera>().unwrap().zoom - 3.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_pan_and_zoom_events() {
        let mut world = world();
        let (tx, rx) = bounded(8);
        world.set_event_outlet(tx);

        world.on_event(&EngineEvent::CameraPan { dx: 5.0, dy: -1.0 });
        world.on_event(&EngineEvent::CameraZoom { factor: 2.0 });
        world.on_event(&EngineEvent::CameraZoom { factor: -1.0 });

        let camera = world.singleton::<Camera>().unwrap();
        assert!((camera.x - 5.0).abs() < f32::EPSILON);
        assert!((camera.y + 1.0).abs() < f32::EPSILON);
        assert!((camera.zoom - 2.0).abs() < f32::EPSILON);

        let moved: Vec<EngineEvent> = rx.try_iter().collect();
        assert_eq!(moved.len(), 2);
        assert_eq!(
            moved[1],
            EngineEvent::CameraMoved {
                x: 5.0,
                y: -1.0,
                zoom: 2.0
            }
        );
    }

    #[test]
    fn test_zoom_clamped() {
        let mut world = world();
        world.on_event(&EngineEvent::CameraZoom { factor: 1000.0 });
        assert!((world.singleton::<Camera>().unwrap().zoom - Camera::MAX_ZOOM).abs() < f32::EPSILON);
    }

    #[test]
    fn test_held_key_pans_each_frame() {
        let mut world = world();
        world.on_event(&EngineEvent::Key {
            code: "ArrowRight".to_string(),
            pressed: true,
        });

        world.on_update(0.5);
        world.on_update(0.5);
        assert!((world.singleton::<Camera>().unwrap().x - 400.0).abs() < 1e-3);

        world.on_event(&EngineEvent::Key {
            code: "ArrowRight".to_string(),
            pressed: false,
        });
        world.on_update(0.5);
        assert!((world.singleton::<Camera>().unwrap().x - 400.0).abs() < 1e-3);
    }

    #[test]
    fn test_resize_updates_viewport() {
        let mut world = world();
        world.on_event(&EngineEvent::Resized {
            width: 640,
            height: 480,
        });
        let camera = world.singleton::<Camera>().unwrap();
        assert_eq!((camera.viewport_width, camera.viewport_height), (640, 480));
    }
}
