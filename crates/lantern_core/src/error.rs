//! # ECS Error Types
//!
//! All errors that can occur while building, loading or exporting a world.
//! Per-frame operations never return these; missing lookups are `Option`s.

use thiserror::Error;

/// Errors that can occur in the ECS runtime.
#[derive(Error, Debug)]
pub enum EcsError {
    /// A snapshot named a system the registry cannot provide.
    ///
    /// This is fatal for snapshot loading: the world is not built.
    #[error("system not found in registry: {0}")]
    UnknownSystem(String),

    /// A one-shot system instance was already handed out by the registry.
    #[error("system instance already consumed: {0}")]
    SystemConsumed(String),

    /// A system with the same name is already attached to the world.
    #[error("system already attached: {0}")]
    DuplicateSystem(String),

    /// No decoder is registered for a component type tag.
    #[error("unknown component type: {0}")]
    UnknownComponent(String),

    /// A component record could not be decoded into its component type.
    #[error("malformed component record `{tag}`: {reason}")]
    MalformedComponent {
        /// The record's type tag.
        tag: String,
        /// What the decoder rejected.
        reason: String,
    },

    /// A component did not serialize to a JSON object (or unit).
    #[error("component `{0}` does not serialize to a JSON object")]
    NotAnObject(String),

    /// Two entity templates in one snapshot carry the same id, or a
    /// recorded id is already taken in the world being built.
    #[error("duplicate entity id in snapshot: {0}")]
    DuplicateEntityId(i64),

    /// A snapshot recorded an id outside the entity id range.
    #[error("invalid entity id in snapshot: {0} (ids start at 0)")]
    InvalidEntityId(i64),

    /// A registry entry built a system under a different name.
    #[error("registry entry `{registered}` produced system `{actual}`")]
    SystemNameMismatch {
        /// Name the entry is registered under.
        registered: String,
        /// Name the built system reports.
        actual: String,
    },

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
