//! # Engine Error Types
//!
//! Errors raised while configuring the engine or moving snapshots on and off
//! disk. Per-frame work does not fail.

use lantern_core::EcsError;
use thiserror::Error;

/// Errors that can occur in the embedding layer.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The ECS runtime rejected an operation (snapshot load, export).
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// Reading or writing a file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`EngineConfig`](crate::EngineConfig).
    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
