// src/utils/errors.rs
//! Engine error type
//!
//! Every failure is terminal for the run. Errors originate upstream of the
//! pipeline (configuration, cache I/O, serialization); the only pipeline
//! errors are precondition failures and a worker thread dying.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the engine
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Dataset size must be greater than zero, got {0}")]
    NonPositiveDatasetSize(i64),

    #[error("Dataset size mismatch: expected {expected} records, found {actual}")]
    DatasetSizeMismatch { expected: usize, actual: usize },

    #[error("Failed to read dataset cache {path:?}: {source}")]
    CacheRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write dataset cache {path:?}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed dataset cache {path:?}: {source}")]
    MalformedCache {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize dataset: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Pipeline incomplete: {received} of {expected} contributions landed")]
    PipelineIncomplete { expected: usize, received: u64 },

    #[error("Worker {0} panicked")]
    WorkerPanicked(usize),

    #[error("Distributor thread panicked")]
    DistributorPanicked,

    #[error("Failed to spawn pipeline thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
