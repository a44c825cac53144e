//! # Fallback Executor
//!
//! Wraps a primary-store operation and a degraded-mode fallback. The
//! executor consults the health monitor first, runs the primary only while
//! the verdict is good, and routes to the fallback on skip or failure -
//! recording the failure, alerting, and scheduling a delayed reconnection
//! along the way. Exactly one branch's result is ever returned.

use crate::database::{PrimaryStore, StoreError};
use crate::resilience::alerts::{Alert, AlertSink};
use crate::resilience::coordinator::CoordinatorHandle;
use crate::resilience::health::{HealthMonitor, HealthState};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Service name stamped onto alerts.
pub const SERVICE_NAME: &str = "storefront-api";

pub struct FallbackExecutor<S> {
    monitor: HealthMonitor<S>,
    state: Arc<HealthState>,
    alerts: Arc<dyn AlertSink>,
    coordinator: CoordinatorHandle,
    reconnect_delay: Duration,
}

impl<S: PrimaryStore> FallbackExecutor<S> {
    pub fn new(
        monitor: HealthMonitor<S>,
        state: Arc<HealthState>,
        alerts: Arc<dyn AlertSink>,
        coordinator: CoordinatorHandle,
        reconnect_delay: Duration,
    ) -> Self {
        Self {
            monitor,
            state,
            alerts,
            coordinator,
            reconnect_delay,
        }
    }

    /// Current liveness verdict (cached within the freshness window).
    pub async fn is_healthy(&self) -> bool {
        self.monitor.is_healthy().await
    }

    /// Run `primary` against the primary store when it is healthy, falling
    /// back to `fallback` when the store is unhealthy or the primary
    /// operation fails.
    ///
    /// The fallback runs if and only if the primary was skipped or failed,
    /// and exactly one branch's result is returned. Fallback errors
    /// propagate untouched - there is no further degradation path.
    pub async fn execute_with_fallback<T, E, P, PF, F, FF>(
        &self,
        primary: P,
        fallback: F,
    ) -> Result<T, E>
    where
        P: FnOnce() -> PF,
        PF: Future<Output = Result<T, StoreError>>,
        F: FnOnce() -> FF,
        FF: Future<Output = Result<T, E>>,
    {
        if self.monitor.is_healthy().await {
            match primary().await {
                Ok(value) => return Ok(value),
                Err(err) => self.handle_failure(&err).await,
            }
        }

        warn!("Using fallback operation due to primary store unavailability");
        fallback().await
    }

    /// React to a primary-store failure: flip health immediately (ahead of
    /// the next probe window), record an alert, and schedule a delayed
    /// reconnection attempt. Alert-sink errors are logged and swallowed so
    /// they can never mask the failure being reported.
    pub async fn handle_failure(&self, err: &StoreError) {
        self.state.mark_unhealthy();
        error!(error = %err, "Primary store operation failed, switching to offline mode");

        let alert = Alert::critical(SERVICE_NAME, err.to_string());
        if let Err(alert_err) = self.alerts.record(alert) {
            error!(error = %alert_err, "Failed to record system alert");
        }

        self.coordinator.schedule_reconnect(self.reconnect_delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::alerts::{AlertError, InMemoryAlertStore};
    use crate::resilience::coordinator::CoordinatorCommand;
    use crate::spool::SpooledRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::mpsc::UnboundedReceiver;

    #[derive(Default)]
    struct FlakyStore {
        unreachable: AtomicBool,
        probes: AtomicUsize,
    }

    #[async_trait]
    impl PrimaryStore for FlakyStore {
        async fn probe(&self) -> Result<(), StoreError> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            if self.unreachable.load(Ordering::SeqCst) {
                Err(StoreError::Io("unreachable".to_string()))
            } else {
                Ok(())
            }
        }

        async fn connection_test(&self) -> Result<(), StoreError> {
            self.probe().await
        }

        async fn apply_spooled(&self, _record: &SpooledRecord) -> Result<(), StoreError> {
            Ok(())
        }
    }

    struct RejectingSink;

    impl AlertSink for RejectingSink {
        fn record(&self, _alert: Alert) -> Result<(), AlertError> {
            Err(AlertError::Sink("sink offline".to_string()))
        }
    }

    fn executor(
        store: Arc<FlakyStore>,
        alerts: Arc<dyn AlertSink>,
    ) -> (
        FallbackExecutor<FlakyStore>,
        UnboundedReceiver<CoordinatorCommand>,
    ) {
        let state = Arc::new(HealthState::new());
        let (handle, rx) = CoordinatorHandle::channel();
        let monitor = HealthMonitor::new(
            store,
            Arc::clone(&state),
            handle.clone(),
            Duration::from_secs(60),
        );
        let executor = FallbackExecutor::new(
            monitor,
            state,
            alerts,
            handle,
            Duration::from_secs(300),
        );
        (executor, rx)
    }

    #[tokio::test]
    async fn test_primary_result_returned_when_healthy() {
        let store = Arc::new(FlakyStore::default());
        let (executor, _rx) = executor(store, Arc::new(InMemoryAlertStore::default()));

        let fallback_ran = Arc::new(AtomicBool::new(false));
        let observer = Arc::clone(&fallback_ran);

        let value: Result<&str, StoreError> = executor
            .execute_with_fallback(
                || async { Ok("primary") },
                || async move {
                    observer.store(true, Ordering::SeqCst);
                    Ok("fallback")
                },
            )
            .await;

        assert_eq!(value.unwrap(), "primary");
        assert!(!fallback_ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_fallback_runs_when_primary_fails() {
        let store = Arc::new(FlakyStore::default());
        let alerts = Arc::new(InMemoryAlertStore::default());
        let (executor, mut rx) = executor(store, Arc::clone(&alerts) as Arc<dyn AlertSink>);

        let value: Result<&str, StoreError> = executor
            .execute_with_fallback(
                || async { Err(StoreError::Io("write refused".to_string())) },
                || async { Ok("fallback") },
            )
            .await;

        assert_eq!(value.unwrap(), "fallback");
        assert!(!executor.state.verdict());
        assert_eq!(alerts.len(), 1);
        assert!(matches!(
            rx.try_recv().unwrap(),
            CoordinatorCommand::ReconnectAfter(_)
        ));
    }

    #[tokio::test]
    async fn test_primary_skipped_entirely_when_unhealthy() {
        let store = Arc::new(FlakyStore::default());
        store.unreachable.store(true, Ordering::SeqCst);
        let (executor, _rx) = executor(Arc::clone(&store), Arc::new(InMemoryAlertStore::default()));

        let primary_ran = Arc::new(AtomicBool::new(false));
        let observer = Arc::clone(&primary_ran);

        let value: Result<&str, StoreError> = executor
            .execute_with_fallback(
                || async move {
                    observer.store(true, Ordering::SeqCst);
                    Ok("primary")
                },
                || async { Ok("fallback") },
            )
            .await;

        assert_eq!(value.unwrap(), "fallback");
        assert!(!primary_ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_fallback_error_propagates_uncaught() {
        let store = Arc::new(FlakyStore::default());
        store.unreachable.store(true, Ordering::SeqCst);
        let (executor, _rx) = executor(store, Arc::new(InMemoryAlertStore::default()));

        let value: Result<&str, String> = executor
            .execute_with_fallback(
                || async { Ok("primary") },
                || async { Err("terminal failure".to_string()) },
            )
            .await;

        assert_eq!(value.unwrap_err(), "terminal failure");
    }

    #[tokio::test]
    async fn test_failing_alert_sink_does_not_change_caller_path() {
        let store = Arc::new(FlakyStore::default());
        let (executor, mut rx) = executor(store, Arc::new(RejectingSink));

        let value: Result<&str, StoreError> = executor
            .execute_with_fallback(
                || async { Err(StoreError::Io("write refused".to_string())) },
                || async { Ok("fallback") },
            )
            .await;

        // Fallback still returned, health still flipped, reconnect still
        // scheduled - the sink failure was logged and swallowed.
        assert_eq!(value.unwrap(), "fallback");
        assert!(!executor.state.verdict());
        assert!(matches!(
            rx.try_recv().unwrap(),
            CoordinatorCommand::ReconnectAfter(_)
        ));
    }

    #[tokio::test]
    async fn test_failure_short_circuits_subsequent_requests() {
        let store = Arc::new(FlakyStore::default());
        let (executor, _rx) = executor(Arc::clone(&store), Arc::new(InMemoryAlertStore::default()));

        let _: Result<&str, StoreError> = executor
            .execute_with_fallback(
                || async { Err(StoreError::Io("write refused".to_string())) },
                || async { Ok("fallback") },
            )
            .await;
        let probes_after_failure = store.probes.load(Ordering::SeqCst);

        // The next request inside the freshness window goes straight to
        // fallback without probing again.
        let primary_ran = Arc::new(AtomicBool::new(false));
        let observer = Arc::clone(&primary_ran);
        let value: Result<&str, StoreError> = executor
            .execute_with_fallback(
                || async move {
                    observer.store(true, Ordering::SeqCst);
                    Ok("primary")
                },
                || async { Ok("fallback") },
            )
            .await;

        assert_eq!(value.unwrap(), "fallback");
        assert!(!primary_ran.load(Ordering::SeqCst));
        assert_eq!(store.probes.load(Ordering::SeqCst), probes_after_failure);
    }
}
