use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::config::Config;
use crate::db::{DatabaseProxy, MemoryPerformanceStore, PerformanceStore, PgPerformanceStore};
use crate::services::adaptive_difficulty::AdaptiveDifficultyService;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    config: Arc<Config>,
    db_proxy: Option<Arc<DatabaseProxy>>,
    adaptive: Arc<AdaptiveDifficultyService>,
}

impl AppState {
    pub fn new(
        config: Config,
        db_proxy: Option<Arc<DatabaseProxy>>,
        adaptive: Arc<AdaptiveDifficultyService>,
    ) -> Self {
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            config: Arc::new(config),
            db_proxy,
            adaptive,
        }
    }

    /// Postgres-backed when a proxy is available, process memory otherwise.
    pub fn create_adaptive_service(
        db_proxy: Option<Arc<DatabaseProxy>>,
    ) -> Arc<AdaptiveDifficultyService> {
        let store: Arc<dyn PerformanceStore> = match db_proxy {
            Some(proxy) => Arc::new(PgPerformanceStore::new(proxy)),
            None => Arc::new(MemoryPerformanceStore::new()),
        };
        Arc::new(AdaptiveDifficultyService::new(store))
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn db_proxy(&self) -> Option<Arc<DatabaseProxy>> {
        self.db_proxy.clone()
    }

    pub fn adaptive(&self) -> Arc<AdaptiveDifficultyService> {
        Arc::clone(&self.adaptive)
    }
}
