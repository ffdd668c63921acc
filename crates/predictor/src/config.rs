//! Configuration for the full prediction pipeline.

use crate::error::Result;
use booster::BoosterConfig;
use pipeline::DEFAULT_N_ACTORS;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Feature and booster settings. Every field is optional in JSON:
/// ```json
/// { "n_actors": 5, "booster": { "n_estimators": 300 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of billed cast slots encoded per movie
    pub n_actors: usize,
    pub booster: BoosterConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            n_actors: DEFAULT_N_ACTORS,
            booster: BoosterConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Read a config from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        info!("Loaded pipeline config from {:?}", path);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_documented_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.n_actors, 9);
        assert_eq!(config.booster.n_estimators, 100);
    }

    #[test]
    fn test_nested_partial_json() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "booster": { "max_depth": 3 } }"#).unwrap();
        assert_eq!(config.n_actors, 9);
        assert_eq!(config.booster.max_depth, 3);
        assert_eq!(config.booster.learning_rate, 0.3);
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!(
            "predictor-config-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{ "n_actors": 4 }"#).unwrap();
        let config = PipelineConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(config.n_actors, 4);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = PipelineConfig::from_json_file(Path::new("/nonexistent/config.json"))
            .unwrap_err();
        assert!(matches!(err, crate::PredictionError::Io(_)));
    }
}
