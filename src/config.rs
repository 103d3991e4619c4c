use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DdrError, Result};
use crate::optimal::SolverOptions;
use crate::routing::RoutingScheme;
use crate::traffic::GeneratorSpec;

/// Everything an environment needs besides its network.
///
/// ```json
/// {
///   "memory_length": 5,
///   "generator": { "shape": [4, 4], "length": 100, "kind": "uniform", "seed": 7 },
///   "routing": { "kind": "softmin", "gamma": 2.0 },
///   "solver": { "enforce_capacity": true }
/// }
/// ```
#[derive(Clone,Debug,PartialEq,Serialize,Deserialize)]
pub struct EnvConfig {
    pub memory_length:usize,
    pub generator:GeneratorSpec,
    #[serde(default)]
    pub routing:RoutingScheme,
    #[serde(default)]
    pub solver:SolverOptions,
}

impl EnvConfig {
    pub fn from_json(text:&str) -> Result<Self> {
        let config:Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path:impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.memory_length == 0 {
            return Err(DdrError::config("memory length must be at least 1"))
        }
        self.generator.validate()?;
        self.routing.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::EnvConfig;
    use crate::error::DdrError;
    use crate::routing::RoutingScheme;

    #[test]
    fn test_parse_with_defaults() {
        let config = EnvConfig::from_json(r#"{
            "memory_length": 3,
            "generator": {"shape": [4, 4], "kind": "uniform", "seed": 7}
        }"#).unwrap();
        assert_eq!(config.memory_length,3);
        assert_eq!(config.routing,RoutingScheme::default());
        assert!(config.solver.enforce_capacity);
        assert_eq!(config.generator.label(),"uniform");
    }

    #[test]
    fn test_rejects_bad_values() {
        let zero = r#"{"memory_length": 0, "generator": {"shape": [2, 2], "kind": "uniform", "seed": 1}}"#;
        assert!(matches!(EnvConfig::from_json(zero),Err(DdrError::Configuration(_))));
        let ragged = r#"{"memory_length": 1, "generator": {"shape": [2, 3], "kind": "uniform", "seed": 1}}"#;
        assert!(matches!(EnvConfig::from_json(ragged),Err(DdrError::Configuration(_))));
        let gamma = r#"{
            "memory_length": 1,
            "generator": {"shape": [2, 2], "kind": "uniform", "seed": 1},
            "routing": {"kind": "softmin", "gamma": -1.0}
        }"#;
        assert!(matches!(EnvConfig::from_json(gamma),Err(DdrError::Configuration(_))));
        assert!(matches!(EnvConfig::from_json("{"),Err(DdrError::Json(_))));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env.json");
        std::fs::write(&path, r#"{
            "memory_length": 2,
            "generator": {"shape": [3, 3], "length": 10, "kind": "gravity", "seed": 3, "total_demand": 30.0},
            "solver": {"enforce_capacity": false}
        }"#).unwrap();
        let config = EnvConfig::from_path(&path).unwrap();
        assert_eq!(config.generator.length,Some(10));
        assert!(!config.solver.enforce_capacity);
        assert!(matches!(EnvConfig::from_path(dir.path().join("missing.json")),Err(DdrError::Io(_))));
    }
}
