use serde::{Deserialize, Serialize};
use std::path::Path;
use config::{Config, ConfigError, File, Environment};

use crate::error::GraphError;

// --- Constants for Default Configuration ---
pub const DEFAULT_HYDRATION_REFRESH_EXISTING: bool = true;
pub const DEFAULT_HYDRATION_PLACEHOLDER_ENDPOINTS: bool = false;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HydrationConfig {
    /// Overwrite labels/properties of an entity already seen in the batch.
    #[serde(default = "default_refresh_existing")]
    pub refresh_existing: bool,
    /// Create bare bound nodes for relationship endpoints missing from the batch.
    #[serde(default = "default_placeholder_endpoints")]
    pub placeholder_endpoints: bool,
}

fn default_refresh_existing() -> bool {
    DEFAULT_HYDRATION_REFRESH_EXISTING
}

fn default_placeholder_endpoints() -> bool {
    DEFAULT_HYDRATION_PLACEHOLDER_ENDPOINTS
}

impl Default for HydrationConfig {
    fn default() -> Self {
        Self {
            refresh_existing: DEFAULT_HYDRATION_REFRESH_EXISTING,
            placeholder_endpoints: DEFAULT_HYDRATION_PLACEHOLDER_ENDPOINTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelConfig {
    #[serde(default)]
    pub hydration: HydrationConfig,
}

impl ModelConfig {
    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("hydration.refresh_existing", DEFAULT_HYDRATION_REFRESH_EXISTING)?
            .set_default("hydration.placeholder_endpoints", DEFAULT_HYDRATION_PLACEHOLDER_ENDPOINTS)
    }

    /// Defaults, then `neokit.toml` if present, then `NEOKIT_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        let s = Self::builder()?
            // File: neokit.toml
            .add_source(File::with_name("neokit").required(false))
            // Environment: NEOKIT_HYDRATION__PLACEHOLDER_ENDPOINTS=true -> hydration.placeholder_endpoints
            .add_source(Environment::with_prefix("NEOKIT").prefix_separator("_").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Defaults overlaid with an explicit file; the file must exist.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let s = Self::builder()?
            .add_source(File::from(path.as_ref()).required(true))
            .build()?;

        s.try_deserialize()
    }

    pub fn from_toml(source: &str) -> Result<Self, GraphError> {
        toml::from_str(source).map_err(|e| GraphError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ModelConfig::default();
        assert!(config.hydration.refresh_existing);
        assert!(!config.hydration.placeholder_endpoints);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = ModelConfig::from_toml("[hydration]\nplaceholder_endpoints = true\n").unwrap();
        assert!(config.hydration.placeholder_endpoints);
        assert!(config.hydration.refresh_existing);

        let empty = ModelConfig::from_toml("").unwrap();
        assert_eq!(empty, ModelConfig::default());
    }

    #[test]
    fn test_from_toml_rejects_bad_types() {
        let err = ModelConfig::from_toml("[hydration]\nrefresh_existing = \"maybe\"\n").unwrap_err();
        assert!(matches!(err, GraphError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("neokit.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[hydration]").unwrap();
        writeln!(file, "refresh_existing = false").unwrap();
        drop(file);

        let config = ModelConfig::load_from(&path).unwrap();
        assert!(!config.hydration.refresh_existing);
        assert!(!config.hydration.placeholder_endpoints);
    }

    #[test]
    fn test_load_from_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ModelConfig::load_from(dir.path().join("absent.toml")).is_err());
    }
}
