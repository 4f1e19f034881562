//! Application state shared by handlers

use crate::services::TimeLoggingService;
use opsportal_core::Config;
use opsportal_db::PgPlanUsageStore;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub time_logging: TimeLoggingService,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Self {
        let store = Arc::new(PgPlanUsageStore::new(pool.clone()));
        Self {
            pool,
            config,
            time_logging: TimeLoggingService::new(store),
        }
    }
}
