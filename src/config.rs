//! # Configuration Management
//!
//! Environment-driven configuration for the server binary and the resilience
//! core. Every setting has a production-sensible default so the process can
//! boot with nothing but `DATABASE_URL` set; tests construct configs directly
//! with short windows and temp directories.

use crate::error::{Result, StorefrontError};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    pub database: DatabaseConfig,
    pub resilience: ResilienceConfig,
    pub spool: SpoolConfig,
    pub web: WebConfig,
}

/// Primary-store connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

/// Timing knobs for the health monitor, reconnection coordinator, and alert
/// retention.
#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    /// How long a probe verdict is reused before a fresh probe is mandatory.
    pub freshness_window_seconds: u64,
    /// Delay before an automatic reconnection attempt after a failure.
    pub reconnect_delay_seconds: u64,
    /// How long recorded alerts stay in the in-memory cache.
    pub alert_retention_seconds: u64,
}

/// Local durable spool settings.
#[derive(Debug, Clone)]
pub struct SpoolConfig {
    pub root_dir: PathBuf,
}

/// Web server settings.
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub bind_address: String,
    pub request_timeout_seconds: u64,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/storefront_development".to_string(),
                max_connections: 10,
                acquire_timeout_seconds: 30,
            },
            resilience: ResilienceConfig {
                freshness_window_seconds: 60,
                reconnect_delay_seconds: 300,
                alert_retention_seconds: 7 * 24 * 60 * 60,
            },
            spool: SpoolConfig {
                root_dir: PathBuf::from("offline-data"),
            },
            web: WebConfig {
                bind_address: "0.0.0.0:3000".to_string(),
                request_timeout_seconds: 30,
            },
        }
    }
}

impl StorefrontConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(db_url) = std::env::var("DATABASE_URL") {
            config.database.url = db_url;
        }

        if let Ok(max_connections) = std::env::var("STOREFRONT_DB_MAX_CONNECTIONS") {
            config.database.max_connections = max_connections.parse().map_err(|e| {
                StorefrontError::Configuration(format!("Invalid db_max_connections: {e}"))
            })?;
        }

        if let Ok(window) = std::env::var("STOREFRONT_HEALTH_FRESHNESS_SECONDS") {
            config.resilience.freshness_window_seconds = window.parse().map_err(|e| {
                StorefrontError::Configuration(format!("Invalid health_freshness_seconds: {e}"))
            })?;
        }

        if let Ok(delay) = std::env::var("STOREFRONT_RECONNECT_DELAY_SECONDS") {
            config.resilience.reconnect_delay_seconds = delay.parse().map_err(|e| {
                StorefrontError::Configuration(format!("Invalid reconnect_delay_seconds: {e}"))
            })?;
        }

        if let Ok(dir) = std::env::var("STOREFRONT_SPOOL_DIR") {
            config.spool.root_dir = PathBuf::from(dir);
        }

        if let Ok(bind) = std::env::var("STOREFRONT_BIND_ADDRESS") {
            config.web.bind_address = bind;
        }

        Ok(config)
    }
}

impl ResilienceConfig {
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_window_seconds)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_seconds)
    }

    pub fn alert_retention(&self) -> Duration {
        Duration::from_secs(self.alert_retention_seconds)
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}
