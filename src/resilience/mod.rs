//! # Resilience Module
//!
//! Degraded-mode execution for the primary store: a health monitor with a
//! time-boxed probe cache, a fallback executor that routes operations to the
//! offline spool when the store is down, and a reconnection coordinator that
//! retries the connection and drains the spool once it returns.
//!
//! ## Architecture
//!
//! - **Health Monitor**: cached liveness verdict, one probe per freshness
//!   window no matter how many requests ask
//! - **Fallback Executor**: exactly-one-branch execution of a primary op and
//!   a degraded fallback, with failure recording
//! - **Coordinator**: channel-fed worker owning delayed reconnection
//!   attempts and spool drains
//! - **Alerts**: write-only TTL cache hooking external paging integrations
//!
//! ## Usage
//!
//! ```rust,no_run
//! use storefront_core::config::ResilienceConfig;
//! use storefront_core::database::PostgresStore;
//! use storefront_core::resilience::build_core;
//! use storefront_core::spool::OfflineSpool;
//! use std::sync::Arc;
//!
//! # fn example(store: Arc<PostgresStore>) -> Result<(), Box<dyn std::error::Error>> {
//! let spool = Arc::new(OfflineSpool::new("offline-data")?);
//! let config = ResilienceConfig {
//!     freshness_window_seconds: 60,
//!     reconnect_delay_seconds: 300,
//!     alert_retention_seconds: 604_800,
//! };
//!
//! let core = build_core(store, spool, &config);
//!
//! // Handlers run operations through the executor:
//! // core.executor.execute_with_fallback(primary_op, fallback_op).await
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod coordinator;
pub mod executor;
pub mod health;

pub use alerts::{Alert, AlertError, AlertSeverity, AlertSink, InMemoryAlertStore};
pub use coordinator::{CoordinatorCommand, CoordinatorHandle, ReconnectCoordinator};
pub use executor::{FallbackExecutor, SERVICE_NAME};
pub use health::{HealthMonitor, HealthState};

use crate::config::ResilienceConfig;
use crate::database::PrimaryStore;
use crate::spool::OfflineSpool;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Fully wired resilience core around one primary store and one spool.
pub struct ResilienceCore<S> {
    pub executor: Arc<FallbackExecutor<S>>,
    pub coordinator: Arc<ReconnectCoordinator<S>>,
    pub alerts: Arc<InMemoryAlertStore>,
    /// Join handle for the coordinator worker. The worker stops when every
    /// `CoordinatorHandle` clone (held by the executor and monitor) is gone.
    pub worker: JoinHandle<()>,
}

/// Wire monitor, executor, coordinator, and alert store around shared
/// injectable health state.
pub fn build_core<S: PrimaryStore>(
    store: Arc<S>,
    spool: Arc<OfflineSpool>,
    config: &ResilienceConfig,
) -> ResilienceCore<S> {
    let state = Arc::new(HealthState::new());
    let alerts = Arc::new(InMemoryAlertStore::new(config.alert_retention()));

    let coordinator = Arc::new(ReconnectCoordinator::new(
        Arc::clone(&store),
        Arc::clone(&state),
        spool,
    ));
    let (handle, worker) = Arc::clone(&coordinator).spawn();

    let monitor = HealthMonitor::new(
        store,
        Arc::clone(&state),
        handle.clone(),
        config.freshness_window(),
    );

    let executor = Arc::new(FallbackExecutor::new(
        monitor,
        state,
        Arc::clone(&alerts) as Arc<dyn AlertSink>,
        handle,
        config.reconnect_delay(),
    ));

    ResilienceCore {
        executor,
        coordinator,
        alerts,
        worker,
    }
}
