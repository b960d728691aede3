// src/dataset/cache.rs
//! File-backed dataset cache
//!
//! Persists records as a JSON array of `{"a": .., "b": ..}` objects. Loading
//! is a pure deserialization: an existing file is never re-randomized.

use crate::dataset::generator::generate_random_records;
use crate::dataset::record::Record;
use crate::utils::errors::{EngineError, Result};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs;
use tracing::{debug, info};

/// Where a materialized dataset came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Read from an existing cache file
    Loaded,

    /// Freshly generated and persisted
    Generated {
        /// Generation plus persistence wall-clock time
        elapsed: Duration,
    },
}

/// Records ready for the pipeline
#[derive(Debug, Clone)]
pub struct Materialized {
    pub records: Vec<Record>,
    pub origin: Origin,
}

/// JSON cache at a fixed path
#[derive(Debug, Clone)]
pub struct DatasetCache {
    path: PathBuf,
}

impl DatasetCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached dataset, or generate and persist `expected` records
    /// when no cache exists. A loaded dataset must hold exactly `expected`
    /// records.
    pub async fn load_or_create(&self, expected: i64) -> Result<Materialized> {
        if expected <= 0 {
            return Err(EngineError::NonPositiveDatasetSize(expected));
        }

        if self.exists().await? {
            info!("Dataset cache {:?} already exists", self.path);

            let records = self.load().await?;
            if records.len() as u64 != expected as u64 {
                return Err(EngineError::DatasetSizeMismatch {
                    expected: expected as usize,
                    actual: records.len(),
                });
            }

            return Ok(Materialized {
                records,
                origin: Origin::Loaded,
            });
        }

        let start = Instant::now();
        let records = generate_random_records(expected)?;
        self.store(&records).await?;
        let elapsed = start.elapsed();

        info!("Dataset saved to {:?} in {:?}", self.path, elapsed);

        Ok(Materialized {
            records,
            origin: Origin::Generated { elapsed },
        })
    }

    /// Read and parse the cache file
    pub async fn load(&self) -> Result<Vec<Record>> {
        let bytes = fs::read(&self.path).await.map_err(|source| EngineError::CacheRead {
            path: self.path.clone(),
            source,
        })?;

        let records: Vec<Record> =
            serde_json::from_slice(&bytes).map_err(|source| EngineError::MalformedCache {
                path: self.path.clone(),
                source,
            })?;

        debug!("Loaded {} records from {:?}", records.len(), self.path);
        Ok(records)
    }

    /// Serialize records and write them to the cache file
    pub async fn store(&self, records: &[Record]) -> Result<()> {
        let bytes = encode(records)?;

        fs::write(&self.path, &bytes).await.map_err(|source| EngineError::CacheWrite {
            path: self.path.clone(),
            source,
        })?;

        debug!("Wrote {} records ({} bytes) to {:?}", records.len(), bytes.len(), self.path);
        Ok(())
    }

    async fn exists(&self) -> Result<bool> {
        fs::try_exists(&self.path).await.map_err(|source| EngineError::CacheRead {
            path: self.path.clone(),
            source,
        })
    }
}

/// JSON array with 4-space indentation
fn encode(records: &[Record]) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(records.len() * 32);
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    records
        .serialize(&mut serializer)
        .map_err(EngineError::Serialize)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_creates_missing_cache() {
        let dir = tempdir().unwrap();
        let cache = DatasetCache::new(dir.path().join("data.json"));

        let materialized = cache.load_or_create(50).await.unwrap();

        assert_eq!(materialized.records.len(), 50);
        assert!(matches!(materialized.origin, Origin::Generated { .. }));
        assert!(cache.path().exists());
    }

    #[tokio::test]
    async fn test_second_run_loads_identical_records() {
        let dir = tempdir().unwrap();
        let cache = DatasetCache::new(dir.path().join("data.json"));

        let created = cache.load_or_create(200).await.unwrap();
        let bytes_after_create = std::fs::read(cache.path()).unwrap();

        let first = cache.load_or_create(200).await.unwrap();
        let second = cache.load_or_create(200).await.unwrap();

        assert_eq!(first.origin, Origin::Loaded);
        assert_eq!(second.origin, Origin::Loaded);
        assert_eq!(created.records, first.records);
        assert_eq!(first.records, second.records);
        assert_eq!(std::fs::read(cache.path()).unwrap(), bytes_after_create);
    }

    #[tokio::test]
    async fn test_loads_existing_cache() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(
            &path,
            r#"[{"a": 3, "b": -1}, {"a": -10, "b": 10}, {"a": 5, "b": 5}]"#,
        )
        .unwrap();

        let materialized = DatasetCache::new(&path).load_or_create(3).await.unwrap();

        assert_eq!(
            materialized.records,
            vec![Record::new(3, -1), Record::new(-10, 10), Record::new(5, 5)]
        );
    }

    #[tokio::test]
    async fn test_count_mismatch_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, r#"[{"a": 1, "b": 2}]"#).unwrap();

        let err = DatasetCache::new(&path).load_or_create(3).await.unwrap_err();

        assert!(matches!(
            err,
            EngineError::DatasetSizeMismatch { expected: 3, actual: 1 }
        ));
    }

    #[tokio::test]
    async fn test_malformed_cache() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "[{\"a\": 1,").unwrap();

        let err = DatasetCache::new(&path).load_or_create(1).await.unwrap_err();
        assert!(matches!(err, EngineError::MalformedCache { .. }));
    }

    #[tokio::test]
    async fn test_non_positive_size_writes_nothing() {
        let dir = tempdir().unwrap();
        let cache = DatasetCache::new(dir.path().join("data.json"));

        for size in [0, -3] {
            let err = cache.load_or_create(size).await.unwrap_err();
            assert!(err.to_string().contains("must be greater than zero"));
        }
        assert!(!cache.path().exists());
    }

    #[tokio::test]
    async fn test_unwritable_cache() {
        let dir = tempdir().unwrap();
        let cache = DatasetCache::new(dir.path().join("missing").join("data.json"));

        let err = cache.load_or_create(5).await.unwrap_err();
        assert!(matches!(err, EngineError::CacheWrite { .. }));
    }

    #[test]
    fn test_encoding_uses_four_space_indent() {
        let encoded = encode(&[Record::new(1, -2)]).unwrap();
        let text = String::from_utf8(encoded).unwrap();
        assert_eq!(text, "[\n    {\n        \"a\": 1,\n        \"b\": -2\n    }\n]");
    }
}
