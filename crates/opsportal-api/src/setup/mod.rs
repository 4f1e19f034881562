//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use opsportal_core::Config;
use opsportal_infra::LogFormat;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    opsportal_infra::init_telemetry(
        "opsportal-api",
        config.environment(),
        LogFormat::for_environment(config.environment()),
    )
    .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    // Fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    tracing::info!("Configuration loaded and validated successfully");

    let pool = database::setup_database(&config).await?;

    let state = Arc::new(AppState::new(config.clone(), pool));

    let router = routes::setup_routes(&config, state.clone()).await?;

    Ok((state, router))
}
