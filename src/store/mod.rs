// src/store/mod.rs

//! Explicit store handle over a SQLite pool. Every component that touches
//! persisted state receives a `Store` (or a clone of it) — there is no
//! process-wide session factory.

mod analysis;
mod commits;
mod files;
mod issues;
pub mod migration;
mod pulls;
pub mod query;

pub use analysis::{PING_PONG_MAX_ROUNDS, REVIEW_BUDDY_MIN_REVIEWS};
pub use files::ChangedFile;

use anyhow::Result;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::time::Duration;

#[derive(Clone)]
pub struct Store {
    pub pool: SqlitePool,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect and apply the schema. Connection failure here is process-fatal
    /// for the binary; callers propagate the error up to `main`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            // SQLite is single-writer, but can have multiple readers
            .max_connections(10)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to connect to store at {database_url}: {e}"))?;

        let store = Self::new(pool);
        migration::run_migrations(&store.pool).await?;
        Ok(store)
    }
}
