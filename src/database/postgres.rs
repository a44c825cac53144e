//! # PostgreSQL Primary Store
//!
//! Pool-backed implementation of [`PrimaryStore`]. The pool is created
//! lazily so the process can boot while the database is unreachable and run
//! in offline mode until the coordinator reconnects.

use crate::config::DatabaseConfig;
use crate::database::{PrimaryStore, StoreError};
use crate::spool::SpooledRecord;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Connection, PgPool};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Build a store around a lazily-connected pool. No round-trip happens
    /// here; the first probe or query establishes connections.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_lazy(&config.url)?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PrimaryStore for PostgresStore {
    async fn probe(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn connection_test(&self) -> Result<(), StoreError> {
        // Acquire and ping, then release the connection back to the pool.
        let mut conn = self.pool.acquire().await?;
        conn.ping().await?;
        Ok(())
    }

    async fn apply_spooled(&self, record: &SpooledRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO offline_replays (owner_id, kind, payload, record_created_at, replayed_at)
             VALUES ($1, $2, $3, $4, NOW())",
        )
        .bind(record.owner_id)
        .bind(&record.kind)
        .bind(&record.payload)
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        debug!(
            owner_id = %record.owner_id,
            kind = %record.kind,
            "Spooled record replayed into primary store"
        );

        Ok(())
    }
}
