#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Storefront Core
//!
//! Resilience-first backend core for multi-tenant small-business storefronts.
//!
//! ## Overview
//!
//! Storefront Core fronts a PostgreSQL system-of-record with a degraded-mode
//! execution layer: when the database is unreachable, writes land in a
//! per-tenant durable spool on local disk, reads serve the latest spooled
//! snapshot, and a background coordinator reconnects and replays the spool
//! once the database returns. API handlers never see a raw outage - they see
//! a fallback result and a degraded marker.
//!
//! ## Architecture
//!
//! The core wraps every primary-store operation in a fallback pair: the
//! [`resilience::FallbackExecutor`] consults a cached health verdict, runs
//! the primary operation only while the store is healthy, and otherwise
//! routes to the caller's fallback while recording the failure and
//! scheduling a delayed reconnection.
//!
//! ## Module Organization
//!
//! - [`resilience`] - Health monitor, fallback executor, reconnection
//!   coordinator, and failure alerts
//! - [`spool`] - Per-tenant durable offline storage with replay-on-drain
//! - [`database`] - Primary-store collaborator trait and PostgreSQL impl
//! - [`models`] - Tenant-scoped business and product models
//! - [`web`] - Axum REST surface (health/status, reconnect, CRUD callers)
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured tracing setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use storefront_core::config::StorefrontConfig;
//! use storefront_core::web::AppState;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StorefrontConfig::from_env()?;
//! let (state, _worker) = AppState::initialize(config).await?;
//!
//! let healthy = state.executor.is_healthy().await;
//! println!("primary store healthy: {healthy}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! The resilience core tests run against scripted in-memory stores and temp
//! spool directories - no database required:
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # All tests
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod resilience;
pub mod spool;
pub mod web;

pub use config::{DatabaseConfig, ResilienceConfig, SpoolConfig, StorefrontConfig, WebConfig};
pub use database::{PostgresStore, PrimaryStore, StoreError};
pub use error::{Result, StorefrontError};
pub use resilience::{
    build_core, FallbackExecutor, HealthMonitor, HealthState, ReconnectCoordinator, ResilienceCore,
};
pub use spool::{DrainReport, OfflineSpool, SpoolError, SpooledRecord};
