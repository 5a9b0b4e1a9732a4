pub mod config;
pub mod memory;
pub mod migrate;
pub mod operations;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

use crate::adaptive::PerformanceProfile;
use crate::db::config::{DbConfig, DbConfigError};

pub use memory::MemoryPerformanceStore;
pub use operations::performance::PgPerformanceStore;

#[derive(Clone)]
pub struct DatabaseProxy {
    config: DbConfig,
    pool: PgPool,
}

impl DatabaseProxy {
    pub async fn from_env() -> Result<Arc<Self>, DbInitError> {
        let config = DbConfig::from_env()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.primary_url)
            .await
            .map_err(DbInitError::Sqlx)?;

        if config.run_migrations {
            migrate::run_migrations(&pool).await?;
        }

        Ok(Arc::new(Self { config, pool }))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip latency of a trivial query, bounded by the pool acquire timeout.
    pub async fn ping(&self) -> Result<Duration, sqlx::Error> {
        let started = Instant::now();
        let query = sqlx::query("SELECT 1").execute(&self.pool);
        let result = tokio::time::timeout(self.config.acquire_timeout, query).await;
        match result {
            Ok(Ok(_)) => Ok(started.elapsed()),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(sqlx::Error::PoolTimedOut),
        }
    }
}

#[derive(Debug, Error)]
pub enum DbInitError {
    #[error(transparent)]
    Config(#[from] DbConfigError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] migrate::MigrationError),
}

impl DbInitError {
    /// No database was configured, as opposed to one that could not be reached or migrated.
    pub fn is_unconfigured(&self) -> bool {
        matches!(self, DbInitError::Config(DbConfigError::Missing { .. }))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("performance profile for user {user_id} was modified concurrently")]
    Conflict { user_id: String },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence for per-user performance profiles.
#[async_trait]
pub trait PerformanceStore: Send + Sync {
    async fn load(&self, user_id: &str) -> Result<Option<PerformanceProfile>, StoreError>;

    /// Inserts `profile` unless one already exists for its user; returns whichever is stored.
    async fn create(&self, profile: &PerformanceProfile) -> Result<PerformanceProfile, StoreError>;

    /// Writes `profile` if the stored version still equals `profile.version`, then bumps it.
    async fn save(&self, profile: &mut PerformanceProfile) -> Result<(), StoreError>;

    fn backend(&self) -> &'static str;
}
