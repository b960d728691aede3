// src/dataset/mod.rs
//! Record materialization
//!
//! The record source feeding the pipeline. Records are loaded from a JSON
//! cache when one exists, otherwise generated and persisted first.
//!
//! ```text
//! cache exists? ──yes──→ read → parse ──────────────→ Vec<Record>
//!       │
//!       no
//!       ↓
//! generate [-10, 10] → serialize (4-space indent) → write → Vec<Record>
//! ```

pub mod cache;
pub mod generator;
pub mod record;

// Re-export commonly used types
pub use cache::{DatasetCache, Materialized, Origin};
pub use generator::{generate_random_records, generate_records, VALUE_MAX, VALUE_MIN};
pub use record::{PartialResult, Record};
