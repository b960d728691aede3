// src/utils/config.rs
//! Engine configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `pairsum.toml` in the working directory, then `PAIRSUM__*` environment
//! variables (e.g. `PAIRSUM__PIPELINE__WORKERS=8`).

use crate::pipeline::{AggregationStrategy, PipelineConfig};
use crate::utils::errors::{EngineError, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file stem, resolved against the working directory
pub const DEFAULT_CONFIG_FILE: &str = "pairsum";

/// Top-level engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub dataset: DatasetSettings,
    pub pipeline: PipelineSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetSettings {
    /// Expected number of records. Signed so that a negative request reaches
    /// validation instead of failing to parse.
    pub size: i64,

    /// JSON cache holding the materialized records
    pub cache_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSettings {
    /// Fixed worker count for the run
    pub workers: usize,

    pub strategy: AggregationStrategy,

    /// Work queue capacity; defaults to the dataset size
    #[serde(default)]
    pub queue_capacity: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl EngineConfig {
    /// Load from `pairsum.toml` (optional) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE), false)
    }

    /// Load from an explicit file; `required` controls whether a missing
    /// file is an error
    pub fn load_from(path: &Path, required: bool) -> Result<Self> {
        let settings = Config::builder()
            .set_default("dataset.size", 1_000_000_i64)?
            .set_default("dataset.cache_path", "data.json")?
            .set_default("pipeline.workers", 3_i64)?
            .set_default("pipeline.strategy", "relay")?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .add_source(File::from(path).required(required))
            .add_source(
                Environment::with_prefix("PAIRSUM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a run
    pub fn validate(&self) -> Result<()> {
        if self.dataset.size <= 0 {
            return Err(EngineError::NonPositiveDatasetSize(self.dataset.size));
        }

        if self.pipeline.workers == 0 {
            return Err(EngineError::InvalidConfig(
                "pipeline.workers must be at least 1".to_string(),
            ));
        }

        if self.pipeline.queue_capacity == Some(0) {
            return Err(EngineError::InvalidConfig(
                "pipeline.queue_capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Expected dataset size as a record count
    pub fn dataset_size(&self) -> Result<usize> {
        usize::try_from(self.dataset.size)
            .map_err(|_| EngineError::NonPositiveDatasetSize(self.dataset.size))
    }

    /// Pipeline configuration for this run
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        Ok(PipelineConfig {
            dataset_size: self.dataset_size()?,
            workers: self.pipeline.workers,
            strategy: self.pipeline.strategy,
            queue_capacity: self.pipeline.queue_capacity,
        })
    }
}
