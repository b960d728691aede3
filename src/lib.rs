// src/lib.rs
//! Pairsum Engine Library
//!
//! Computes the sum of paired values over a fixed-size dataset by fanning
//! records out to a bounded worker pool and folding the partial results back
//! into one total.
//!
//! # Architecture
//!
//! The engine is structured into several key modules:
//!
//! - **dataset**: record type, random generation, JSON cache
//! - **pipeline**: work queue, distributor, workers, aggregation, completion gate
//! - **observability**: tracing setup
//! - **utils**: configuration and errors

// Public module exports
pub mod dataset;
pub mod observability;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use dataset::{DatasetCache, Record};
pub use pipeline::{AggregationStrategy, Pipeline, PipelineConfig, PipelineReport, Total};
pub use utils::config::EngineConfig;
pub use utils::errors::{EngineError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
