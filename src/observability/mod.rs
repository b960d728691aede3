// src/observability/mod.rs
//! Tracing initialisation
//!
//! `RUST_LOG` takes precedence over the configured level.

use crate::utils::config::LoggingSettings;
use crate::utils::errors::{EngineError, Result};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
pub fn init_tracing(settings: &LoggingSettings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| EngineError::InvalidConfig(format!("Invalid log level: {}", e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_target(false);

    let installed = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| {
        EngineError::InvalidConfig(format!("Tracing already initialised: {}", e))
    })
}
