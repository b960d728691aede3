// src/main.rs
//! Pairsum Engine
//!
//! Materializes the record dataset (loading the JSON cache or creating it),
//! then aggregates it on the worker pool and reports the total.

use anyhow::Result;
use pairsum_engine::dataset::{DatasetCache, Origin};
use pairsum_engine::observability::init_tracing;
use pairsum_engine::pipeline::Pipeline;
use pairsum_engine::utils::config::EngineConfig;
use std::time::Instant;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();

    let config = EngineConfig::load()?;
    init_tracing(&config.logging)?;

    info!("Starting Pairsum Engine v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded: {:?}", config);

    if let Err(e) = run(&config, start).await {
        error!("Run failed: {}", e);
        return Err(e);
    }

    Ok(())
}

async fn run(config: &EngineConfig, start: Instant) -> Result<()> {
    // Validate before touching the cache
    let pipeline = Pipeline::new(config.pipeline_config()?)?;

    let cache = DatasetCache::new(&config.dataset.cache_path);
    let materialized = cache.load_or_create(config.dataset.size).await?;

    if let Origin::Generated { elapsed } = materialized.origin {
        println!("Dataset saved to {}", cache.path().display());
        println!("Dataset creation time: {:?}", elapsed);
    }

    info!(
        "Running {} strategy with {} workers",
        pipeline.config().strategy,
        pipeline.config().workers
    );
    let report = pipeline.run_async(materialized.records).await?;

    println!("Total: {}", report.total.value());
    println!("Pipeline time: {:?}", report.elapsed);
    println!("Total run time: {:?}", start.elapsed());

    Ok(())
}
