//! Storage layer for the Murmur mirror.
//!
//! This module provides database operations for:
//! - Content (posts/comments keyed by transaction hash)
//! - Votes (one row per vote transaction)
//! - Records (audit ledger entries) and per-key epoch totals
//! - Proofs and announced state-tree roots
//! - Sync state (watermark tracking)
//!
//! Reads used for queries outside the sync path go through the pool.
//! Every mutation takes a `&mut SqliteConnection` so the projector can
//! compose all writes for one event into a single transaction.

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

pub mod content;
pub mod proof;
pub mod record;
pub mod sync;
pub mod types;
pub mod vote;

pub use types::*;

/// Database storage for the synchronizer.
///
/// Provides async access to SQLite with connection pooling.
#[derive(Debug, Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Create a new storage instance with the given database URL.
    ///
    /// This will create the database file if it doesn't exist.
    ///
    /// # Arguments
    /// * `database_url` - SQLite database URL (e.g., "sqlite://murmur.db")
    /// * `max_connections` - Optional pool maximum (default 5)
    /// * `min_connections` - Optional pool minimum (default 1)
    pub async fn new(
        database_url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self> {
        info!("Connecting to database: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.unwrap_or(5))
            .min_connections(min_connections.unwrap_or(1))
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        info!("Database connection established");

        Ok(Self { pool })
    }

    /// Create a new storage instance with a specific file path.
    pub async fn new_with_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let database_url = format!("sqlite://{}", path.display());
        Self::new(&database_url, None, None).await
    }

    /// Run database migrations.
    ///
    /// This should be called once during initialization to ensure the
    /// schema is up to date.
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;

        info!("Migrations completed successfully");

        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin a scoped mutation context.
    ///
    /// All writes for one ledger event go through the returned transaction
    /// and commit (or roll back) together.
    pub async fn begin(&self) -> sqlx::Result<Transaction<'_, Sqlite>> {
        self.pool.begin().await
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        info!("Closing database connection");
        self.pool.close().await;
    }

    /// Get database statistics.
    pub async fn stats(&self) -> Result<DatabaseStats> {
        let content_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM content")
            .fetch_one(&self.pool)
            .await?;

        let vote_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM votes")
            .fetch_one(&self.pool)
            .await?;

        let record_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records")
            .fetch_one(&self.pool)
            .await?;

        let proof_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM proofs")
            .fetch_one(&self.pool)
            .await?;

        let nullifier_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM nullifiers WHERE confirmed = 1")
                .fetch_one(&self.pool)
                .await?;

        let sync_state = self.get_sync_state().await?;

        Ok(DatabaseStats {
            content_count: content_count as u64,
            vote_count: vote_count as u64,
            record_count: record_count as u64,
            proof_count: proof_count as u64,
            confirmed_nullifier_count: nullifier_count as u64,
            last_block_number: sync_state.last_block_number,
        })
    }

    /// Check database health.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database health check failed")?;

        Ok(())
    }
}

/// Database statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Total mirrored posts and comments.
    pub content_count: u64,

    /// Total mirrored votes.
    pub vote_count: u64,

    /// Total audit ledger entries.
    pub record_count: u64,

    /// Total recorded proofs.
    pub proof_count: u64,

    /// Total confirmed spend nullifiers.
    pub confirmed_nullifier_count: u64,

    /// Last processed block number.
    pub last_block_number: u64,
}
