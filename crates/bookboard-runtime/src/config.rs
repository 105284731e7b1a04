#![forbid(unsafe_code)]

//! Board configuration as data.
//!
//! Every pixel metric and threshold the board uses lives in one
//! [`BoardConfig`], loadable from JSON (and TOML with the `config-toml`
//! feature). The host loads it and injects it; nothing in the board reads
//! files on its own.
//!
//! ```json
//! {
//!   "timescale": { "pixels_per_day": 48.0 },
//!   "packing": { "bar_unit": 20.0, "level_ceiling": 12 },
//!   "animation": { "duration_ms": 180 }
//! }
//! ```
//!
//! Missing sections and fields keep their defaults, and the defaults match
//! the constants in `bookboard-layout` and the drag module.

use std::fmt;
use std::path::Path;

use bookboard_layout::{HeightAnimationConfig, PackingConfig, Timescale};
use serde::{Deserialize, Serialize};

use crate::drag::DragConfig;

/// Default stacking cache capacity.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Everything tunable about a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub timescale: Timescale,
    pub packing: PackingConfig,
    pub animation: HeightAnimationConfig,
    pub drag: DragConfig,
    /// Maximum cached `(lane, window)` packings.
    pub cache_capacity: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            timescale: Timescale::default(),
            packing: PackingConfig::default(),
            animation: HeightAnimationConfig::default(),
            drag: DragConfig::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl BoardConfig {
    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Load from a TOML string.
    #[cfg(feature = "config-toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config-toml")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !self.timescale.is_usable() {
            errors.push(format!(
                "timescale: pixels_per_day must be > 0 and gutter_px >= 0, got {} / {}",
                self.timescale.pixels_per_day, self.timescale.gutter_px
            ));
        }
        if self.timescale.gutter_px * 2.0 >= self.timescale.pixels_per_day {
            errors.push("timescale: gutters leave no room for a one-day bar".to_string());
        }

        let p = &self.packing;
        if !(p.overlap_tolerance_px >= 0.0) {
            errors.push(format!(
                "packing.overlap_tolerance_px must be >= 0, got {}",
                p.overlap_tolerance_px
            ));
        }
        if p.level_ceiling == 0 {
            errors.push("packing.level_ceiling must be >= 1".to_string());
        }
        for (name, value) in [
            ("base_padding", p.base_padding),
            ("bar_unit", p.bar_unit),
            ("inter_bar_gap", p.inter_bar_gap),
            ("floor_height", p.floor_height),
        ] {
            if !(value >= 0.0) || !value.is_finite() {
                errors.push(format!("packing.{name} must be a finite value >= 0, got {value}"));
            }
        }
        if p.bar_unit <= 0.0 {
            errors.push("packing.bar_unit must be > 0".to_string());
        }

        if !(self.animation.epsilon_px >= 0.0) {
            errors.push(format!(
                "animation.epsilon_px must be >= 0, got {}",
                self.animation.epsilon_px
            ));
        }

        if !(self.drag.edge_threshold_px >= 0.0) {
            errors.push(format!(
                "drag.edge_threshold_px must be >= 0, got {}",
                self.drag.edge_threshold_px
            ));
        }
        if !(self.drag.lane_hysteresis_px >= 0.0) {
            errors.push(format!(
                "drag.lane_hysteresis_px must be >= 0, got {}",
                self.drag.lane_hysteresis_px
            ));
        }

        if self.cache_capacity == 0 {
            errors.push("cache_capacity must be >= 1".to_string());
        }

        errors
    }

    /// Validate, turning any problems into a [`ConfigError::Validation`].
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Errors that can occur when loading a board configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config-toml")]
    Toml(toml::de::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config-toml")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "config-toml")]
            Self::Toml(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(BoardConfig::default().validate().is_empty());
    }

    #[test]
    fn defaults_match_module_constants() {
        let config = BoardConfig::default();
        assert_eq!(
            config.timescale.pixels_per_day,
            bookboard_layout::position::DEFAULT_PIXELS_PER_DAY
        );
        assert_eq!(
            config.packing.level_ceiling,
            bookboard_layout::pack::DEFAULT_LEVEL_CEILING
        );
        assert_eq!(config.animation.duration_ms, 220);
        assert_eq!(
            config.drag.edge_threshold_px,
            crate::drag::DEFAULT_EDGE_THRESHOLD_PX
        );
        assert_eq!(config.cache_capacity, DEFAULT_CACHE_CAPACITY);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = BoardConfig::from_json_str(
            r#"{"timescale":{"pixels_per_day":48.0},"packing":{"level_ceiling":12}}"#,
        )
        .unwrap();
        assert_eq!(config.timescale.pixels_per_day, 48.0);
        assert_eq!(config.timescale.gutter_px, Timescale::default().gutter_px);
        assert_eq!(config.packing.level_ceiling, 12);
        assert_eq!(config.packing.bar_unit, PackingConfig::default().bar_unit);
        assert_eq!(config.drag, DragConfig::default());
    }

    #[test]
    fn empty_json_is_default() {
        assert_eq!(BoardConfig::from_json_str("{}").unwrap(), BoardConfig::default());
    }

    #[test]
    fn bad_json_is_a_parse_error() {
        let err = BoardConfig::from_json_str("{ nope").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(err.to_string().starts_with("JSON parse error"));
    }

    #[test]
    fn validation_collects_every_problem() {
        let mut config = BoardConfig::default();
        config.timescale.pixels_per_day = 0.0;
        config.packing.level_ceiling = 0;
        config.cache_capacity = 0;
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.starts_with("timescale")));
        assert!(errors.iter().any(|e| e.contains("level_ceiling")));
        assert!(errors.iter().any(|e| e.contains("cache_capacity")));

        let err = config.validated().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref list) if list.len() >= 3));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = BoardConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[cfg(feature = "config-toml")]
    #[test]
    fn toml_sections_parse() {
        let config = BoardConfig::from_toml_str(
            "cache_capacity = 32\n[animation]\nduration_ms = 150\n[drag]\nlane_hysteresis_px = 12.0\n",
        )
        .unwrap();
        assert_eq!(config.cache_capacity, 32);
        assert_eq!(config.animation.duration_ms, 150);
        assert_eq!(config.drag.lane_hysteresis_px, 12.0);
    }
}
