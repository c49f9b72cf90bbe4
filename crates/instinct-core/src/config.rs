//! Simulation configuration.
//!
//! All engine tuning is loaded from a TOML file; every field has a default
//! so a partial file (or none at all) works.

use std::path::Path;

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use instinct_spatial::KindMask;

use crate::components::agent::LIGHT;

/// Complete engine configuration.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// World extent along x, in world units.
    pub world_width: f32,
    /// World extent along y, in world units.
    pub world_height: f32,
    /// Cell resolution of the proximity index along x.
    pub grid_cols: usize,
    /// Cell resolution of the proximity index along y.
    pub grid_rows: usize,
    /// Radius handed to nearest-neighbour queries, world units.
    pub search_radius: f32,
    /// Kinds sensed by exhaustive scan instead of the proximity index.
    pub ubiquitous: KindMask,
    /// Heading change per unit of steering activation, radians.
    pub steering_rate: f32,
    /// Fixed timestep handed to node updates.
    pub dt: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            world_width: 1000.0,
            world_height: 600.0,
            grid_cols: 10,
            grid_rows: 10,
            search_radius: 150.0,
            ubiquitous: LIGHT,
            steering_rate: 0.0025,
            dt: 1.0,
        }
    }
}

impl SimConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::Parse)
    }
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_the_defaults() {
        let config = SimConfig::from_toml("").unwrap();
        assert_eq!(config.grid_cols, 10);
        assert_eq!(config.search_radius, 150.0);
        assert_eq!(config.ubiquitous, LIGHT);
    }

    #[test]
    fn partial_toml_overrides_named_fields_only() {
        let config = SimConfig::from_toml("search_radius = 300.0\nworld_width = 2000.0").unwrap();
        assert_eq!(config.search_radius, 300.0);
        assert_eq!(config.world_width, 2000.0);
        assert_eq!(config.world_height, 600.0);
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = SimConfig::from_toml("world_width = \"wide\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
