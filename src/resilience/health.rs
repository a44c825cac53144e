//! # Primary Store Health Monitor
//!
//! Tracks primary-store reachability with a time-boxed cache of the last
//! probe verdict so concurrent requests do not probe on every call. The
//! state object is injectable (no hidden singleton): monitor, executor, and
//! coordinator all share one `Arc<HealthState>`, and tests run as many
//! independent instances as they like.
//!
//! Staleness is tolerated by design - a race costs at most one redundant
//! probe or one request briefly acting on an outdated verdict.

use crate::database::PrimaryStore;
use crate::resilience::coordinator::CoordinatorHandle;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

#[derive(Debug, Clone, Copy)]
struct Snapshot {
    healthy: bool,
    last_checked: Option<Instant>,
}

/// Shared liveness verdict for the primary store.
#[derive(Debug)]
pub struct HealthState {
    inner: Mutex<Snapshot>,
}

impl HealthState {
    /// Starts optimistic with no probe on record, so the first health check
    /// always probes.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Snapshot {
                healthy: true,
                last_checked: None,
            }),
        }
    }

    /// Current verdict, regardless of freshness.
    pub fn verdict(&self) -> bool {
        self.inner.lock().healthy
    }

    /// Cached verdict if the last probe is within the freshness window.
    pub fn cached_verdict(&self, window: Duration) -> Option<bool> {
        let snapshot = self.inner.lock();
        match snapshot.last_checked {
            Some(checked) if checked.elapsed() < window => Some(snapshot.healthy),
            _ => None,
        }
    }

    /// Record a successful probe or reconnection.
    pub fn mark_healthy(&self) {
        let mut snapshot = self.inner.lock();
        snapshot.healthy = true;
        snapshot.last_checked = Some(Instant::now());
    }

    /// Record a failed probe or operation. Stamps the check time so
    /// subsequent requests short-circuit to fallback for the rest of the
    /// window instead of re-probing a store that just failed.
    pub fn mark_unhealthy(&self) {
        let mut snapshot = self.inner.lock();
        snapshot.healthy = false;
        snapshot.last_checked = Some(Instant::now());
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

/// Probing monitor in front of a shared [`HealthState`].
pub struct HealthMonitor<S> {
    store: Arc<S>,
    state: Arc<HealthState>,
    coordinator: CoordinatorHandle,
    freshness_window: Duration,
}

impl<S: PrimaryStore> HealthMonitor<S> {
    pub fn new(
        store: Arc<S>,
        state: Arc<HealthState>,
        coordinator: CoordinatorHandle,
        freshness_window: Duration,
    ) -> Self {
        Self {
            store,
            state,
            coordinator,
            freshness_window,
        }
    }

    pub fn state(&self) -> &Arc<HealthState> {
        &self.state
    }

    /// Cached-or-fresh liveness verdict. Never propagates a probe error;
    /// any failure reads as "unhealthy". An unhealthy-to-healthy transition
    /// submits a spool drain to the coordinator without blocking the caller.
    pub async fn is_healthy(&self) -> bool {
        if let Some(verdict) = self.state.cached_verdict(self.freshness_window) {
            return verdict;
        }

        let was_healthy = self.state.verdict();
        match self.store.probe().await {
            Ok(()) => {
                self.state.mark_healthy();
                if !was_healthy {
                    info!("Primary store connection restored");
                    self.coordinator.request_drain();
                }
                true
            }
            Err(err) => {
                self.state.mark_unhealthy();
                error!(error = %err, "Primary store liveness probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::StoreError;
    use crate::resilience::coordinator::CoordinatorCommand;
    use crate::spool::SpooledRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingStore {
        probes: AtomicUsize,
        fail: AtomicBool,
    }

    #[async_trait]
    impl PrimaryStore for CountingStore {
        async fn probe(&self) -> Result<(), StoreError> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(StoreError::Io("probe refused".to_string()))
            } else {
                Ok(())
            }
        }

        async fn connection_test(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn apply_spooled(&self, _record: &SpooledRecord) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn monitor(
        store: Arc<CountingStore>,
        window: Duration,
    ) -> (
        HealthMonitor<CountingStore>,
        tokio::sync::mpsc::UnboundedReceiver<CoordinatorCommand>,
    ) {
        let (handle, rx) = CoordinatorHandle::channel();
        let monitor = HealthMonitor::new(store, Arc::new(HealthState::new()), handle, window);
        (monitor, rx)
    }

    #[tokio::test]
    async fn test_verdict_is_cached_within_freshness_window() {
        let store = Arc::new(CountingStore::default());
        let (monitor, _rx) = monitor(Arc::clone(&store), Duration::from_secs(60));

        assert!(monitor.is_healthy().await);
        assert!(monitor.is_healthy().await);
        assert!(monitor.is_healthy().await);

        assert_eq!(store.probes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fresh_probe_after_window_elapses() {
        let store = Arc::new(CountingStore::default());
        let (monitor, _rx) = monitor(Arc::clone(&store), Duration::from_millis(20));

        assert!(monitor.is_healthy().await);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(monitor.is_healthy().await);

        assert_eq!(store.probes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_probe_failure_reads_as_unhealthy() {
        let store = Arc::new(CountingStore::default());
        store.fail.store(true, Ordering::SeqCst);
        let (monitor, _rx) = monitor(Arc::clone(&store), Duration::from_secs(60));

        assert!(!monitor.is_healthy().await);
        // Failure verdict is cached too.
        assert!(!monitor.is_healthy().await);
        assert_eq!(store.probes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovery_transition_requests_drain() {
        let store = Arc::new(CountingStore::default());
        store.fail.store(true, Ordering::SeqCst);
        let (monitor, mut rx) = monitor(Arc::clone(&store), Duration::from_millis(10));

        assert!(!monitor.is_healthy().await);

        store.fail.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(monitor.is_healthy().await);

        let command = rx.try_recv().unwrap();
        assert!(matches!(command, CoordinatorCommand::Drain));
    }

    #[tokio::test]
    async fn test_healthy_probe_does_not_request_drain() {
        let store = Arc::new(CountingStore::default());
        let (monitor, mut rx) = monitor(Arc::clone(&store), Duration::from_secs(60));

        assert!(monitor.is_healthy().await);
        assert!(rx.try_recv().is_err());
    }
}
