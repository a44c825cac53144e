//! # Primary Store Collaborator
//!
//! The resilience core treats the system-of-record database as a narrow
//! collaborator: a liveness probe, an open/close connection test, and the
//! replay hook the spool drain uses. Every failure surfaces as a single
//! generic [`StoreError`] - the core deliberately does not distinguish
//! timeouts from refused connections from auth failures.
//!
//! Production code uses [`postgres::PostgresStore`]; tests substitute scripted
//! mocks with call counters.

pub mod postgres;
pub mod schema;

use crate::spool::SpooledRecord;
use async_trait::async_trait;
use thiserror::Error;

pub use postgres::PostgresStore;

/// The only error condition the resilience core distinguishes.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Primary store I/O failure: {0}")]
    Io(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

/// Narrow contract the resilience core requires from the primary store.
#[async_trait]
pub trait PrimaryStore: Send + Sync + 'static {
    /// Trivial liveness round-trip, used by the health monitor.
    async fn probe(&self) -> Result<(), StoreError>;

    /// Lightweight open/close connection test, used by the reconnection
    /// coordinator.
    async fn connection_test(&self) -> Result<(), StoreError>;

    /// Replay one spooled record into the primary store during a drain.
    async fn apply_spooled(&self, record: &SpooledRecord) -> Result<(), StoreError>;
}
