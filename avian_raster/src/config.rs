//! Configuration for a survey session.
//!
//! Configuration can be loaded from JSON files or constructed programmatically:
//!
//! ```no_run
//! use avian_raster::SurveyConfig;
//! use std::path::Path;
//!
//! let config = SurveyConfig::from_json_file(Path::new("survey.json"))?;
//! let defaults = SurveyConfig::default();
//! # Ok::<(), avian_raster::Error>(())
//! ```
//!
//! Every field is optional in the file; missing fields take their defaults.

use crate::core_modules::band::band::DEFAULT_BAND_COUNT;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest width or height a loaded image keeps before it is downscaled.
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

/// Upper bound on bands per aggregation.
pub const MAX_BAND_COUNT: usize = 4096;

/// Tunables for the parallel color aggregation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Number of horizontal bands the image is split into.
    pub band_count: usize,
    /// Number of threads in the fixed worker pool.
    pub workers: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            band_count: DEFAULT_BAND_COUNT,
            workers: DEFAULT_BAND_COUNT,
        }
    }
}

impl AggregatorConfig {
    pub fn new(band_count: usize, workers: usize) -> Self {
        Self { band_count, workers }
    }

    /// One band and one worker per logical CPU.
    pub fn from_available_parallelism() -> Self {
        let cpus = num_cpus::get().clamp(1, MAX_BAND_COUNT);
        Self::new(cpus, cpus)
    }

    pub fn validate(&self) -> Result<()> {
        if self.band_count == 0 || self.band_count > MAX_BAND_COUNT {
            return Err(Error::config(format!(
                "band_count must be between 1 and {MAX_BAND_COUNT}, got {}",
                self.band_count
            )));
        }
        if self.workers == 0 {
            return Err(Error::config("workers must be at least 1"));
        }
        Ok(())
    }
}

/// Complete configuration for a `Survey`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    /// Images wider or taller than this are downscaled on load, keeping their
    /// aspect ratio. `None` keeps images at full size.
    pub max_dimension: Option<u32>,

    /// Size bands and workers from the CPU count instead of `aggregation`.
    pub auto_parallelism: bool,

    pub aggregation: AggregatorConfig,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            max_dimension: Some(DEFAULT_MAX_DIMENSION),
            auto_parallelism: false,
            aggregation: AggregatorConfig::default(),
        }
    }
}

impl SurveyConfig {
    /// The aggregator settings that will actually be used.
    pub fn aggregator_config(&self) -> AggregatorConfig {
        if self.auto_parallelism {
            AggregatorConfig::from_available_parallelism()
        } else {
            self.aggregation
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_dimension == Some(0) {
            return Err(Error::config("max_dimension must be at least 1"));
        }
        self.aggregator_config().validate()
    }

    /// Load and validate configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| Error::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let file_error = |reason: String| Error::ConfigFile {
            path: path.to_path_buf(),
            reason,
        };
        let json = serde_json::to_string_pretty(self).map_err(|e| file_error(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| file_error(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("avian_raster_config_{}_{name}.json", std::process::id()))
    }

    #[test]
    fn defaults_match_the_ten_band_layout() {
        let config = SurveyConfig::default();
        assert_eq!(config.max_dimension, Some(1024));
        assert_eq!(config.aggregator_config(), AggregatorConfig::new(10, 10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn round_trips_through_json_file() {
        let path = temp_path("round_trip");
        let config = SurveyConfig {
            max_dimension: None,
            auto_parallelism: false,
            aggregation: AggregatorConfig::new(4, 2),
        };
        config.to_json_file(&path).unwrap();
        let loaded = SurveyConfig::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: SurveyConfig = serde_json::from_str(r#"{"aggregation": {"workers": 3}}"#).unwrap();
        assert_eq!(config.max_dimension, Some(DEFAULT_MAX_DIMENSION));
        assert_eq!(config.aggregation, AggregatorConfig::new(DEFAULT_BAND_COUNT, 3));
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(AggregatorConfig::new(0, 1).validate().is_err());
        assert!(AggregatorConfig::new(MAX_BAND_COUNT + 1, 1).validate().is_err());
        assert!(AggregatorConfig::new(10, 0).validate().is_err());

        let config = SurveyConfig {
            max_dimension: Some(0),
            ..SurveyConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn unreadable_file_names_the_path() {
        let path = temp_path("does_not_exist");
        let err = SurveyConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, Error::ConfigFile { .. }));
        assert!(err.to_string().contains("does_not_exist"));
    }

    #[test]
    fn auto_parallelism_uses_cpu_count() {
        let config = SurveyConfig {
            auto_parallelism: true,
            ..SurveyConfig::default()
        };
        let aggregator = config.aggregator_config();
        assert_eq!(aggregator.band_count, num_cpus::get().clamp(1, MAX_BAND_COUNT));
        assert_eq!(aggregator.workers, aggregator.band_count);
    }
}
