//! Persistence layer for workflow definitions.
//!
//! Repositories issue parameterized statements against PostgreSQL through a
//! shared [`sqlx::PgPool`]. The pool is an injected handle with an explicit
//! lifecycle: the hosting process calls [`create_pool`] at startup, runs
//! migrations, and closes the pool on shutdown. Multi-step operations hold
//! one transaction for their entire duration; dropping an uncommitted
//! transaction rolls it back, so every early-error return path is safe.

use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

pub mod config;
pub mod error;
pub mod models;
pub mod repositories;

pub use config::DbConfig;
pub use error::{DbError, ErrorKind};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from configuration.
///
/// Acquisition waits at most `acquire_timeout_secs` under saturation; the
/// resulting `PoolTimedOut` is classified retryable (see [`DbError`]).
pub async fn create_pool(config: &DbConfig) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.database_url)
        .await
}

/// Apply all pending migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}

/// Cheap connectivity probe.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
