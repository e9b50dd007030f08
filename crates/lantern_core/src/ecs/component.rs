//! # Component System
//!
//! Components are pure data records with no behavior. Each component type
//! carries a process-unique type tag; an entity holds at most one component
//! per tag.
//!
//! Entities store components type-erased behind [`AnyComponent`], but reads
//! go through the concrete type: `entity.component::<Transform>()` returns
//! `Option<&Transform>` with no caller-side casting.

use std::any::Any;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{EcsError, EcsResult};

/// Marker trait for ECS components.
///
/// Components must be:
/// - `Clone`: worlds can be copied and exported
/// - `Serialize` / `Deserialize`: components travel in snapshots
/// - `Debug`: diagnostics
///
/// Fields holding external handles (a physics body, a GPU texture) should be
/// `#[serde(skip)]` so the rest of the record still round-trips.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Debug, Default, Serialize, Deserialize)]
/// struct Velocity {
///     x: f32,
///     y: f32,
/// }
///
/// impl Component for Velocity {
///     const TAG: &'static str = "Velocity";
/// }
/// ```
pub trait Component: Clone + fmt::Debug + Serialize + DeserializeOwned + 'static {
    /// Unique type tag for this component type.
    ///
    /// This is the `type` discriminator of the component's snapshot record.
    const TAG: &'static str;
}

/// Object-safe view of a component, used by entity storage.
///
/// Implemented for every [`Component`]; there is no reason to implement it
/// by hand.
pub trait AnyComponent: Any + fmt::Debug {
    /// The component's type tag.
    fn tag(&self) -> &'static str;

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete type.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Owned upcast for recovering a boxed concrete value.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Clones the component into a new box.
    fn clone_boxed(&self) -> Box<dyn AnyComponent>;

    /// Encodes the component as a snapshot record.
    ///
    /// # Errors
    ///
    /// Fails if serialization fails or produces something other than a JSON
    /// object (unit structs are accepted and encode with no fields).
    fn to_record(&self) -> EcsResult<ComponentRecord>;
}

impl<T: Component> AnyComponent for T {
    fn tag(&self) -> &'static str {
        T::TAG
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_boxed(&self) -> Box<dyn AnyComponent> {
        Box::new(self.clone())
    }

    fn to_record(&self) -> EcsResult<ComponentRecord> {
        let fields = match serde_json::to_value(self)? {
            Value::Object(mut map) => {
                // The record tag is authoritative.
                map.remove(ComponentRecord::TYPE_KEY);
                map
            }
            Value::Null => Map::new(),
            _ => return Err(EcsError::NotAnObject(T::TAG.to_string())),
        };

        Ok(ComponentRecord {
            tag: T::TAG.to_string(),
            fields,
        })
    }
}

impl Clone for Box<dyn AnyComponent> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

/// Serialized form of one component: `{"type": "<tag>", ...fields}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// The component type tag.
    #[serde(rename = "type")]
    pub tag: String,
    /// Shape-specific fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ComponentRecord {
    /// Key of the type discriminator in the wire format.
    pub const TYPE_KEY: &'static str = "type";

    /// Creates a record with no fields.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            fields: Map::new(),
        }
    }

    /// Adds a field, builder style.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Decodes this record as component `T`.
    ///
    /// Records with no fields also decode into unit structs.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::MalformedComponent`] if the tag differs from
    /// `T::TAG` or the fields do not match `T`'s shape.
    pub fn decode<T: Component>(&self) -> EcsResult<T> {
        if self.tag != T::TAG {
            return Err(EcsError::MalformedComponent {
                tag: self.tag.clone(),
                reason: format!("expected type `{}`", T::TAG),
            });
        }

        let malformed = |e: serde_json::Error| EcsError::MalformedComponent {
            tag: self.tag.clone(),
            reason: e.to_string(),
        };

        match serde_json::from_value::<T>(Value::Object(self.fields.clone())) {
            Ok(component) => Ok(component),
            Err(err) if self.fields.is_empty() => {
                serde_json::from_value::<T>(Value::Null).map_err(|_| malformed(err))
            }
            Err(err) => Err(malformed(err)),
        }
    }
}

/// A set of component tags a system requires together.
///
/// An entity satisfies the tuple when every tag is attached to it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComponentTuple {
    tags: Vec<&'static str>,
}

impl ComponentTuple {
    /// Creates a tuple from a list of tags. Duplicates are collapsed.
    #[must_use]
    pub fn of(tags: &[&'static str]) -> Self {
        let mut unique: Vec<&'static str> = Vec::with_capacity(tags.len());
        for &tag in tags {
            if !unique.contains(&tag) {
                unique.push(tag);
            }
        }
        Self { tags: unique }
    }

    /// Returns the required tags.
    #[inline]
    #[must_use]
    pub fn tags(&self) -> &[&'static str] {
        &self.tags
    }

    /// Checks whether `has_tag` reports every required tag as present.
    ///
    /// The empty tuple is satisfied by any entity.
    #[inline]
    pub fn is_satisfied_by(&self, mut has_tag: impl FnMut(&str) -> bool) -> bool {
        self.tags.iter().all(|tag| has_tag(tag))
    }
}

impl From<&[&'static str]> for ComponentTuple {
    fn from(tags: &[&'static str]) -> Self {
        Self::of(tags)
    }
}

impl<const N: usize> From<[&'static str; N]> for ComponentTuple {
    fn from(tags: [&'static str; N]) -> Self {
        Self::of(&tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Health {
        current: u32,
        max: u32,
    }

    impl Component for Health {
        const TAG: &'static str = "Health";
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Player;

    impl Component for Player {
        const TAG: &'static str = "Player";
    }

    #[test]
    fn test_record_shape() {
        let record = Health { current: 3, max: 10 }.to_record().unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, json!({"type": "Health", "current": 3, "max": 10}));
    }

    #[test]
    fn test_unit_component_record() {
        let record = Player.to_record().unwrap();
        assert!(record.fields.is_empty());
        assert_eq!(record.decode::<Player>().unwrap(), Player);
    }

    #[test]
    fn test_decode_wrong_tag() {
        let record = ComponentRecord::new("Mana");
        assert!(matches!(
            record.decode::<Health>(),
            Err(EcsError::MalformedComponent { .. })
        ));
    }

    #[test]
    fn test_decode_missing_field() {
        let record = ComponentRecord::new("Health").with_field("current", json!(1));
        let err = record.decode::<Health>().unwrap_err();
        assert!(err.to_string().contains("max"));
    }

    #[test]
    fn test_parse_record_from_wire() {
        let record: ComponentRecord =
            serde_json::from_value(json!({"type": "Health", "current": 5, "max": 5})).unwrap();
        assert_eq!(record.tag, "Health");
        assert_eq!(record.decode::<Health>().unwrap(), Health { current: 5, max: 5 });
    }

    #[test]
    fn test_boxed_downcast() {
        let boxed: Box<dyn AnyComponent> = Box::new(Health { current: 1, max: 2 });
        assert_eq!(boxed.tag(), "Health");
        let copy = boxed.clone();
        assert_eq!(
            copy.as_any().downcast_ref::<Health>(),
            Some(&Health { current: 1, max: 2 })
        );
    }

    #[test]
    fn test_tuple_dedup_and_match() {
        let tuple = ComponentTuple::of(&["A", "B", "A"]);
        assert_eq!(tuple.tags(), &["A", "B"]);
        assert!(tuple.is_satisfied_by(|t| t == "A" || t == "B"));
        assert!(!tuple.is_satisfied_by(|t| t == "A"));
        assert!(ComponentTuple::default().is_satisfied_by(|_| false));
    }
}
