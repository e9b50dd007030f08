//! # Component Catalog
//!
//! Maps component type tags to decoders so snapshot records can be turned
//! back into typed components. Owned by the loader; there is no global
//! catalog.

use std::collections::HashMap;

use tracing::warn;

use crate::config::UnknownComponentPolicy;
use crate::ecs::{AnyComponent, Component, ComponentRecord};
use crate::error::{EcsError, EcsResult};

/// Type-erased decoder for one component type.
type DecodeFn = fn(&ComponentRecord) -> EcsResult<Box<dyn AnyComponent>>;

fn decode_boxed<T: Component>(record: &ComponentRecord) -> EcsResult<Box<dyn AnyComponent>> {
    Ok(Box::new(record.decode::<T>()?))
}

/// Registry of component decoders keyed by type tag.
#[derive(Clone, Default)]
pub struct ComponentCatalog {
    decoders: HashMap<&'static str, DecodeFn>,
}

impl std::fmt::Debug for ComponentCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentCatalog")
            .field("tags", &self.tags())
            .finish()
    }
}

impl ComponentCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers component type `T` under `T::TAG`.
    ///
    /// Registering the same tag twice keeps the latest decoder.
    pub fn register<T: Component>(&mut self) -> &mut Self {
        self.decoders.insert(T::TAG, decode_boxed::<T>);
        self
    }

    /// Checks if a tag has a decoder.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.decoders.contains_key(tag)
    }

    /// Number of registered component types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    /// Checks if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Registered tags, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<&'static str> = self.decoders.keys().copied().collect();
        tags.sort_unstable();
        tags
    }

    /// Decodes a record into a boxed component.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::UnknownComponent`] for unregistered tags and
    /// [`EcsError::MalformedComponent`] for records that do not fit.
    pub fn decode(&self, record: &ComponentRecord) -> EcsResult<Box<dyn AnyComponent>> {
        let decode = self
            .decoders
            .get(record.tag.as_str())
            .ok_or_else(|| EcsError::UnknownComponent(record.tag.clone()))?;
        decode(record)
    }

    /// Decodes a record, applying `policy` to unregistered tags.
    ///
    /// Returns `Ok(None)` when the record was skipped.
    ///
    /// # Errors
    ///
    /// Malformed records always fail. Unknown tags fail under
    /// [`UnknownComponentPolicy::Reject`].
    pub fn decode_with_policy(
        &self,
        record: &ComponentRecord,
        policy: UnknownComponentPolicy,
    ) -> EcsResult<Option<Box<dyn AnyComponent>>> {
        match self.decode(record) {
            Ok(component) => Ok(Some(component)),
            Err(EcsError::UnknownComponent(tag)) if policy == UnknownComponentPolicy::Skip => {
                warn!(tag = %tag, "skipping unknown component record");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Label {
        text: String,
    }

    impl Component for Label {
        const TAG: &'static str = "Label";
    }

    #[test]
    fn test_decode_registered() {
        let mut catalog = ComponentCatalog::new();
        catalog.register::<Label>();

        let record = ComponentRecord::new("Label").with_field("text", json!("hi"));
        let component = catalog.decode(&record).unwrap();
        assert_eq!(component.tag(), "Label");
        assert_eq!(
            component.as_any().downcast_ref::<Label>(),
            Some(&Label { text: "hi".to_string() })
        );
    }

    #[test]
    fn test_unknown_policy() {
        let catalog = ComponentCatalog::new();
        let record = ComponentRecord::new("Ghost");

        assert!(matches!(
            catalog.decode_with_policy(&record, UnknownComponentPolicy::Reject),
            Err(EcsError::UnknownComponent(_))
        ));
        assert!(catalog
            .decode_with_policy(&record, UnknownComponentPolicy::Skip)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_malformed_fails_even_when_skipping() {
        let mut catalog = ComponentCatalog::new();
        catalog.register::<Label>();

        let record = ComponentRecord::new("Label").with_field("text", json!(3));
        assert!(matches!(
            catalog.decode_with_policy(&record, UnknownComponentPolicy::Skip),
            Err(EcsError::MalformedComponent { .. })
        ));
    }
}
