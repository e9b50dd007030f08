//! # World Configuration
//!
//! Runtime knobs for a [`WorldManager`](crate::WorldManager). Loaded once at
//! startup, usually as the `[world]` table of the engine's TOML file.

use serde::{Deserialize, Serialize};

use crate::error::{EcsError, EcsResult};

/// What snapshot loading does with a component record whose tag has no
/// registered decoder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownComponentPolicy {
    /// Fail the load with [`EcsError::UnknownComponent`].
    #[default]
    Reject,
    /// Log a warning and drop the record.
    Skip,
}

/// Order in which `on_update` walks the three phases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOrder {
    /// Each system runs begin, per-entity and end before the next system
    /// starts: `A.begin, A.update.., A.end, B.begin, ..`.
    #[default]
    PerSystem,
    /// Every system's begin phase, then every system's per-entity phase,
    /// then every system's end phase.
    Phased,
}

/// Configuration for a world manager.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Handling of unrecognized component tags during snapshot loading.
    pub unknown_components: UnknownComponentPolicy,
    /// Re-validate subscriptions of entities whose component set changed
    /// before each update. When off, stale matches persist until the
    /// entity is destroyed.
    pub revalidate_subscriptions: bool,
    /// Phase ordering of `on_update`.
    pub update_order: UpdateOrder,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            unknown_components: UnknownComponentPolicy::Reject,
            revalidate_subscriptions: true,
            update_order: UpdateOrder::PerSystem,
        }
    }
}

impl WorldConfig {
    /// Parses a world configuration from TOML content.
    ///
    /// Missing keys fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the content is not valid TOML
    /// or a value has the wrong shape.
    pub fn from_toml(content: &str) -> EcsResult<Self> {
        toml::from_str(content).map_err(|e| EcsError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorldConfig::default();
        assert_eq!(config.unknown_components, UnknownComponentPolicy::Reject);
        assert!(config.revalidate_subscriptions);
        assert_eq!(config.update_order, UpdateOrder::PerSystem);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = WorldConfig::from_toml(
            r#"
unknown_components = "skip"
update_order = "phased"
"#,
        )
        .unwrap();

        assert_eq!(config.unknown_components, UnknownComponentPolicy::Skip);
        assert_eq!(config.update_order, UpdateOrder::Phased);
        assert!(config.revalidate_subscriptions);
    }

    #[test]
    fn test_reject_bad_value() {
        let err = WorldConfig::from_toml(r#"unknown_components = "ignore""#).unwrap_err();
        assert!(matches!(err, EcsError::InvalidConfig(_)));
    }
}
