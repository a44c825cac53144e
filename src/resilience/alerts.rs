//! # Failure Alerts
//!
//! Ephemeral notification records created when the primary store fails.
//! Alerts are write-only from the core's perspective - they exist so an
//! external paging/notification integration has something to read. The
//! default sink is an in-memory TTL cache with 7-day retention, keyed by a
//! timestamp string.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_ALERT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertSeverity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub raised_at: DateTime<Utc>,
    pub service: String,
    pub error: String,
    pub severity: AlertSeverity,
}

impl Alert {
    pub fn critical(service: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            raised_at: Utc::now(),
            service: service.into(),
            error: error.into(),
            severity: AlertSeverity::Critical,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum AlertError {
    #[error("Alert sink rejected entry: {0}")]
    Sink(String),
}

/// Destination for failure alerts. Implementations must never block the
/// calling request path for long; the failure handler swallows sink errors.
pub trait AlertSink: Send + Sync {
    fn record(&self, alert: Alert) -> Result<(), AlertError>;
}

struct StoredAlert {
    #[allow(dead_code)] // held for external inspection, never read by the core
    alert: Alert,
    expires_at: Instant,
}

/// In-memory TTL cache of alerts, keyed by `alert_{timestamp}`.
pub struct InMemoryAlertStore {
    entries: DashMap<String, StoredAlert>,
    retention: Duration,
}

impl InMemoryAlertStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            retention,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn prune_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, stored| stored.expires_at > now);
    }
}

impl Default for InMemoryAlertStore {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_RETENTION)
    }
}

impl AlertSink for InMemoryAlertStore {
    fn record(&self, alert: Alert) -> Result<(), AlertError> {
        self.prune_expired();

        let key = format!("alert_{}", alert.raised_at.format("%Y%m%d%H%M%S%3f"));
        debug!(key = %key, severity = ?alert.severity, "Alert recorded");

        self.entries.insert(
            key,
            StoredAlert {
                alert,
                expires_at: Instant::now() + self.retention,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_keeps_alert_until_retention_expires() {
        let store = InMemoryAlertStore::new(Duration::from_secs(60));
        store
            .record(Alert::critical("storefront-api", "connection refused"))
            .unwrap();

        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_expired_alerts_are_pruned_on_next_record() {
        let store = InMemoryAlertStore::new(Duration::from_millis(1));
        store
            .record(Alert::critical("storefront-api", "first failure"))
            .unwrap();

        std::thread::sleep(Duration::from_millis(5));
        store
            .record(Alert::critical("storefront-api", "second failure"))
            .unwrap();

        assert_eq!(store.len(), 1);
    }
}
