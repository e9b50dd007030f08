//! Registries pre-filled with the built-in components and systems.
//!
//! Games extend these with their own entries before loading a snapshot.

use lantern_core::{ComponentCatalog, SystemRegistry};

use crate::components::{Camera, Sprite, Transform, Velocity};
use crate::events::EngineEvent;
use crate::systems::{CameraControllerSystem, DrawSink, MovementSystem, SpriteRenderSystem};

/// Decoders for every built-in component.
#[must_use]
pub fn builtin_catalog() -> ComponentCatalog {
    let mut catalog = ComponentCatalog::new();
    catalog
        .register::<Transform>()
        .register::<Velocity>()
        .register::<Sprite>()
        .register::<Camera>();
    catalog
}

/// Factories for every built-in system.
///
/// `sprite_render` draws into a [`NullSink`](crate::NullSink); use
/// [`builtin_registry_with_sink`] to render somewhere.
#[must_use]
pub fn builtin_registry() -> SystemRegistry<EngineEvent> {
    let mut registry: SystemRegistry<EngineEvent> = SystemRegistry::new();
    registry
        .register_default::<MovementSystem>()
        .register_default::<CameraControllerSystem>()
        .register_default::<SpriteRenderSystem>();
    registry
}

/// Built-in systems with `sprite_render` drawing into sinks from `make_sink`.
#[must_use]
pub fn builtin_registry_with_sink<F>(make_sink: F) -> SystemRegistry<EngineEvent>
where
    F: Fn() -> Box<dyn DrawSink> + 'static,
{
    let mut registry = builtin_registry();
    registry.register_factory(SpriteRenderSystem::NAME, move || {
        Box::new(SpriteRenderSystem::new(make_sink()))
            as Box<dyn lantern_core::System<EngineEvent>>
    });
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::RecordingSink;

    #[test]
    fn test_catalog_tags() {
        assert_eq!(
            builtin_catalog().tags(),
            vec!["Camera", "Sprite", "Transform", "Velocity"]
        );
    }

    #[test]
    fn test_registry_names() {
        assert_eq!(
            builtin_registry().names(),
            vec!["camera_controller", "movement", "sprite_render"]
        );
    }

    #[test]
    fn test_registry_with_sink() {
        let sink = RecordingSink::new();
        let shared = sink.clone();
        let mut registry = builtin_registry_with_sink(move || Box::new(shared.clone()) as Box<dyn DrawSink>);

        let system = registry.instantiate(SpriteRenderSystem::NAME).unwrap();
        assert_eq!(system.name(), SpriteRenderSystem::NAME);
        assert_eq!(sink.frame_count(), 0);
    }
}
