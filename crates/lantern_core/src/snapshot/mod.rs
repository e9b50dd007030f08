//! # World Snapshots
//!
//! A snapshot is a data-only description of a world: which systems to
//! instantiate (by name), every entity's components, and the singleton
//! components. It carries no subscription state; subscriptions are rebuilt
//! on load.
//!
//! ## Wire format
//!
//! ```text
//! {
//!   "systemNames": ["movement", "camera"],
//!   "singletons": { "components": [ {"type": "Camera", ...} ] },
//!   "entities": [ { "id": 0, "components": [ {"type": "Transform", ...} ] } ]
//! }
//! ```
//!
//! Entity `id`s are optional on input; entities without one receive fresh
//! ids above the highest recorded id.

mod catalog;
mod registry;

pub use catalog::ComponentCatalog;
pub use registry::{SystemFactory, SystemRegistry};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::WorldConfig;
use crate::ecs::{ComponentRecord, Entity, EntityId, WorldManager};
use crate::error::{EcsError, EcsResult};

/// Component list of one entity.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityTemplate {
    /// Recorded entity id, preserved on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Component records.
    #[serde(default)]
    pub components: Vec<ComponentRecord>,
}

impl EntityTemplate {
    /// Captures an entity's components.
    ///
    /// # Errors
    ///
    /// Fails if a component does not serialize.
    pub fn from_entity(entity: &Entity) -> EcsResult<Self> {
        let id = if entity.id().is_singleton() {
            None
        } else {
            Some(entity.id().raw())
        };
        Ok(Self {
            id,
            components: entity.to_records()?,
        })
    }
}

/// Transportable description of a whole world.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldSnapshot {
    /// Systems to instantiate, in registration order.
    #[serde(default)]
    pub system_names: Vec<String>,
    /// Singleton components.
    #[serde(default)]
    pub singletons: EntityTemplate,
    /// Entities in id order.
    #[serde(default)]
    pub entities: Vec<EntityTemplate>,
}

impl WorldSnapshot {
    /// Parses a snapshot from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Json`] on malformed JSON or a record without a
    /// `type`.
    pub fn from_json(json: &str) -> EcsResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encodes the snapshot as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Json`] if encoding fails.
    pub fn to_json(&self) -> EcsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl<E> WorldManager<E> {
    /// Exports the world as a snapshot.
    ///
    /// Systems contribute only their names; subscriber tables are not saved.
    ///
    /// # Errors
    ///
    /// Fails if any component does not serialize.
    pub fn export_state(&self) -> EcsResult<WorldSnapshot> {
        let entities = self
            .entities()
            .iter()
            .map(EntityTemplate::from_entity)
            .collect::<EcsResult<Vec<_>>>()?;

        let snapshot = WorldSnapshot {
            system_names: self.system_names().into_iter().map(str::to_string).collect(),
            singletons: EntityTemplate::from_entity(self.singletons())?,
            entities,
        };
        info!(
            systems = snapshot.system_names.len(),
            entities = snapshot.entities.len(),
            "world exported"
        );
        Ok(snapshot)
    }

    /// Builds a world from a snapshot.
    ///
    /// 1. Each named system is taken from `registry` and attached
    ///    (`on_attach` fires).
    /// 2. Singleton components are decoded and stored, overwriting anything
    ///    the systems installed on attach.
    /// 3. Entities are created in snapshot order under their recorded ids,
    ///    their components attached, and each is synced against every system.
    ///
    /// Recorded ids are reserved before step 1, so entities spawned in
    /// `on_attach` and templates without an id get ids above all of them.
    ///
    /// # Errors
    ///
    /// - [`EcsError::UnknownSystem`] / [`EcsError::SystemNameMismatch`]: a
    ///   named system cannot be built
    /// - [`EcsError::DuplicateEntityId`]: two templates share an id
    /// - [`EcsError::InvalidEntityId`]: a recorded id is negative
    /// - [`EcsError::UnknownComponent`] / [`EcsError::MalformedComponent`]:
    ///   a record cannot be decoded (unknown tags per `config`)
    pub fn from_snapshot(
        snapshot: &WorldSnapshot,
        registry: &mut SystemRegistry<E>,
        catalog: &ComponentCatalog,
        config: WorldConfig,
    ) -> EcsResult<Self> {
        let policy = config.unknown_components;
        let highest = highest_recorded_id(&snapshot.entities)?;
        let mut world = Self::with_config(config);

        // Recorded ids are claimed before any system can spawn in on_attach.
        if let Some(highest) = highest {
            world.reserve_ids_through(EntityId::new(highest));
        }

        for name in &snapshot.system_names {
            let system = registry.instantiate(name)?;
            world.add_boxed_system(system)?;
        }

        for record in &snapshot.singletons.components {
            if let Some(component) = catalog.decode_with_policy(record, policy)? {
                world.singletons_mut().add_boxed(component);
            }
        }

        for template in &snapshot.entities {
            let id = match template.id {
                Some(raw) => EntityId::new(raw),
                None => world.allocate_id(),
            };
            if world.entities().contains(id) {
                return Err(EcsError::DuplicateEntityId(id.raw()));
            }

            let mut entity = Entity::new(id);
            for record in &template.components {
                if let Some(component) = catalog.decode_with_policy(record, policy)? {
                    entity.add_boxed(component);
                }
            }
            world.insert_entity(entity);
            world.sync_entity(id);
        }

        info!(
            systems = world.system_count(),
            entities = world.entity_count(),
            "world loaded from snapshot"
        );
        Ok(world)
    }
}

/// Validates recorded ids and returns the highest one.
fn highest_recorded_id(entities: &[EntityTemplate]) -> EcsResult<Option<i64>> {
    let mut seen: HashSet<i64> = HashSet::with_capacity(entities.len());
    for raw in entities.iter().filter_map(|t| t.id) {
        if raw < 0 {
            return Err(EcsError::InvalidEntityId(raw));
        }
        if !seen.insert(raw) {
            return Err(EcsError::DuplicateEntityId(raw));
        }
    }
    Ok(seen.into_iter().max())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_field_names() {
        let snapshot = WorldSnapshot {
            system_names: vec!["movement".to_string()],
            singletons: EntityTemplate::default(),
            entities: vec![EntityTemplate {
                id: Some(3),
                components: vec![ComponentRecord::new("X")],
            }],
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            value,
            json!({
                "systemNames": ["movement"],
                "singletons": {"components": []},
                "entities": [{"id": 3, "components": [{"type": "X"}]}],
            })
        );
    }

    #[test]
    fn test_parse_without_ids() {
        let snapshot = WorldSnapshot::from_json(
            r#"{"systemNames": [], "singletons": {"components": []},
                "entities": [{"components": [{"type": "X", "v": 1}]}]}"#,
        )
        .unwrap();
        assert_eq!(snapshot.entities[0].id, None);
        assert_eq!(snapshot.entities[0].components[0].fields["v"], json!(1));
    }

    #[test]
    fn test_record_without_type_rejected() {
        let err = WorldSnapshot::from_json(
            r#"{"entities": [{"components": [{"v": 1}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, EcsError::Json(_)));
    }

    #[test]
    fn test_recorded_id_validation() {
        let template = |id| EntityTemplate {
            id,
            components: Vec::new(),
        };

        assert_eq!(highest_recorded_id(&[]).unwrap(), None);
        assert_eq!(
            highest_recorded_id(&[template(Some(2)), template(None), template(Some(9))]).unwrap(),
            Some(9)
        );
        assert!(matches!(
            highest_recorded_id(&[template(Some(0)), template(Some(-3))]),
            Err(EcsError::InvalidEntityId(-3))
        ));
        assert!(matches!(
            highest_recorded_id(&[template(Some(4)), template(Some(4))]),
            Err(EcsError::DuplicateEntityId(4))
        ));
    }
}
