//! # Web API Application State
//!
//! Shared state for the web API: configuration, the primary store, the
//! offline spool, and the resilience core routing operations between them.

use crate::config::StorefrontConfig;
use crate::database::{schema, PostgresStore};
use crate::error::{Result, StorefrontError};
use crate::resilience::{
    build_core, FallbackExecutor, InMemoryAlertStore, ReconnectCoordinator,
};
use crate::spool::OfflineSpool;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Shared application state for the web API
///
/// Cloned into every request handler. Holds:
/// - The lazily-connected primary store
/// - The per-tenant offline spool
/// - The fallback executor and reconnection coordinator
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<StorefrontConfig>,
    pub store: Arc<PostgresStore>,
    pub spool: Arc<OfflineSpool>,
    pub executor: Arc<FallbackExecutor<PostgresStore>>,
    pub coordinator: Arc<ReconnectCoordinator<PostgresStore>>,
    pub alerts: Arc<InMemoryAlertStore>,
}

impl AppState {
    /// Build the full application state and start the coordinator worker.
    ///
    /// The database pool connects lazily and schema bootstrap failure is
    /// tolerated: the process boots into offline mode and the resilience
    /// core takes over from there.
    pub async fn initialize(config: StorefrontConfig) -> Result<(Self, JoinHandle<()>)> {
        let store = Arc::new(
            PostgresStore::connect_lazy(&config.database)
                .map_err(|e| StorefrontError::Database(e.to_string()))?,
        );

        match schema::ensure_schema(store.pool()).await {
            Ok(()) => info!("Database connection successful"),
            Err(err) => warn!(
                error = %err,
                "Database connection failed, running in offline mode"
            ),
        }

        let spool = Arc::new(
            OfflineSpool::new(config.spool.root_dir.clone())
                .map_err(|e| StorefrontError::Spool(e.to_string()))?,
        );

        let core = build_core(Arc::clone(&store), Arc::clone(&spool), &config.resilience);

        let state = Self {
            config: Arc::new(config),
            store,
            spool,
            executor: core.executor,
            coordinator: core.coordinator,
            alerts: core.alerts,
        };

        Ok((state, core.worker))
    }
}
