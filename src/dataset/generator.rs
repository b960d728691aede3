// src/dataset/generator.rs
//! Random record generation

use crate::dataset::record::Record;
use crate::utils::errors::{EngineError, Result};
use rand::Rng;
use tracing::debug;

/// Smallest generated field value
pub const VALUE_MIN: i32 = -10;

/// Largest generated field value
pub const VALUE_MAX: i32 = 10;

/// Generate `count` records with both fields uniform over `[VALUE_MIN, VALUE_MAX]`
pub fn generate_records<R: Rng>(count: i64, rng: &mut R) -> Result<Vec<Record>> {
    if count <= 0 {
        return Err(EngineError::NonPositiveDatasetSize(count));
    }

    let count = usize::try_from(count).map_err(|_| {
        EngineError::InvalidConfig(format!("Dataset size {} does not fit in memory", count))
    })?;

    debug!("Generating {} records", count);

    let records = (0..count)
        .map(|_| {
            Record::new(
                rng.gen_range(VALUE_MIN..=VALUE_MAX),
                rng.gen_range(VALUE_MIN..=VALUE_MAX),
            )
        })
        .collect();

    Ok(records)
}

/// Generate records from an OS-seeded RNG
pub fn generate_random_records(count: i64) -> Result<Vec<Record>> {
    generate_records(count, &mut rand::thread_rng())
}
