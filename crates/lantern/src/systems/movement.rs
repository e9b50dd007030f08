//! Integrates velocity into transforms.

use lantern_core::{Component, ComponentTuple, Entity, System, SystemContext};

use crate::components::{Transform, Velocity};
use crate::events::EngineEvent;

/// Moves every entity carrying both `Transform` and `Velocity`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MovementSystem;

impl MovementSystem {
    /// Registry name.
    pub const NAME: &'static str = "movement";
}

impl System<EngineEvent> for MovementSystem {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn component_tuples(&self) -> Vec<ComponentTuple> {
        vec![ComponentTuple::of(&[Transform::TAG, Velocity::TAG])]
    }

    fn on_entity_update(
        &mut self,
        dt: f32,
        entity: &mut Entity,
        _sub_index: usize,
        _ctx: &mut SystemContext<'_, EngineEvent>,
    ) {
        let Some(velocity) = entity.component::<Velocity>().cloned() else {
            return;
        };
        if let Some(transform) = entity.component_mut::<Transform>() {
            transform.x += velocity.x * dt;
            transform.y += velocity.y * dt;
            transform.rotation += velocity.angular * dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lantern_core::WorldManager;

    #[test]
    fn test_integrates_velocity() {
        let mut world: WorldManager<EngineEvent> = WorldManager::new();
        world.add_system(MovementSystem).unwrap();

        let id = world.create_entity();
        if let Some(entity) = world.entity_mut(id) {
            entity.add_component(Transform::at(0.0, 0.0));
            entity.add_component(Velocity {
                x: 2.0,
                y: -4.0,
                angular: 1.0,
            });
        }
        world.register_components(id);

        world.on_update(0.5);

        let transform = world.entity(id).and_then(|e| e.component::<Transform>()).unwrap();
        assert!((transform.x - 1.0).abs() < f32::EPSILON);
        assert!((transform.y + 2.0).abs() < f32::EPSILON);
        assert!((transform.rotation - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_static_entities_ignored() {
        let mut world: WorldManager<EngineEvent> = WorldManager::new();
        world.add_system(MovementSystem).unwrap();

        let id = world.create_entity();
        if let Some(entity) = world.entity_mut(id) {
            entity.add_component(Transform::at(3.0, 3.0));
        }
        world.register_components(id);

        assert_eq!(world.subscription(MovementSystem::NAME, id), None);
        world.on_update(1.0);
        assert_eq!(
            world.entity(id).and_then(|e| e.component::<Transform>()),
            Some(&Transform::at(3.0, 3.0))
        );
    }
}
