//! # Engine Configuration
//!
//! Loaded once at startup from TOML:
//!
//! ```toml
//! [world]
//! unknown_components = "skip"
//!
//! [frame]
//! target_fps = 60
//! max_delta_seconds = 0.1
//! event_capacity = 1024
//!
//! [log]
//! filter = "lantern=debug"
//! ```
//!
//! Every key is optional.

use std::path::Path;
use std::time::Duration;

use lantern_core::WorldConfig;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Frame loop settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Target frames per second, used for budget accounting.
    pub target_fps: u32,
    /// Upper bound on the delta time handed to systems.
    ///
    /// Keeps simulation from exploding after a pause or a breakpoint.
    pub max_delta_seconds: f32,
    /// Capacity of each event channel.
    pub event_capacity: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            max_delta_seconds: 0.1,
            event_capacity: 1024,
        }
    }
}

impl FrameConfig {
    /// Frame budget implied by `target_fps`.
    #[must_use]
    pub fn target_frame_time(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_fps.max(1)))
    }

    /// Clamps a raw delta into `[0, max_delta_seconds]`.
    #[inline]
    #[must_use]
    pub fn clamp_delta(&self, dt: f32) -> f32 {
        if dt.is_nan() {
            return 0.0;
        }
        dt.clamp(0.0, self.max_delta_seconds)
    }
}

/// Logging settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default `tracing` filter directive when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "lantern=info,lantern_core=info".to_string(),
        }
    }
}

/// Complete engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// World manager settings.
    pub world: WorldConfig,
    /// Frame loop settings.
    pub frame: FrameConfig,
    /// Logging settings.
    pub log: LogConfig,
}

impl EngineConfig {
    /// Parses and validates a configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Toml`] for malformed content and
    /// [`EngineError::InvalidConfig`] for out-of-range values.
    pub fn from_toml(content: &str) -> EngineResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to a TOML file
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml`](Self::from_toml).
    pub fn load(path: impl AsRef<Path>) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] naming the first bad value.
    pub fn validate(&self) -> EngineResult<()> {
        if self.frame.target_fps == 0 {
            return Err(EngineError::InvalidConfig(
                "frame.target_fps must be positive".to_string(),
            ));
        }
        let max_delta = self.frame.max_delta_seconds;
        if max_delta.is_nan() || max_delta <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "frame.max_delta_seconds must be positive".to_string(),
            ));
        }
        if self.frame.event_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "frame.event_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lantern_core::{UnknownComponentPolicy, UpdateOrder};

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.frame.target_fps, 60);
    }

    #[test]
    fn test_sections() {
        let config = EngineConfig::from_toml(
            r#"
[world]
unknown_components = "skip"
update_order = "phased"

[frame]
target_fps = 30
max_delta_seconds = 0.25

[log]
filter = "lantern=debug"
"#,
        )
        .unwrap();

        assert_eq!(config.world.unknown_components, UnknownComponentPolicy::Skip);
        assert_eq!(config.world.update_order, UpdateOrder::Phased);
        assert_eq!(config.frame.target_fps, 30);
        assert_eq!(config.frame.event_capacity, 1024);
        assert_eq!(config.log.filter, "lantern=debug");
    }

    #[test]
    fn test_rejects_zero_fps() {
        let err = EngineConfig::from_toml("[frame]\ntarget_fps = 0\n").unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_bad_toml() {
        let err = EngineConfig::from_toml("[frame\n").unwrap_err();
        assert!(matches!(err, EngineError::Toml(_)));
    }

    #[test]
    fn test_clamp_delta() {
        let frame = FrameConfig::default();
        assert!((frame.clamp_delta(5.0) - 0.1).abs() < f32::EPSILON);
        assert!(frame.clamp_delta(-1.0).abs() < f32::EPSILON);
        assert!(frame.clamp_delta(f32::NAN).abs() < f32::EPSILON);
        assert!((frame.clamp_delta(0.016) - 0.016).abs() < f32::EPSILON);
    }

    #[test]
    fn test_target_frame_time() {
        let frame = FrameConfig::default();
        assert_eq!(frame.target_frame_time().as_micros(), 16_666);
    }
}
