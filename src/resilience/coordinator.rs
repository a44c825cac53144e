//! # Reconnection & Sync Coordinator
//!
//! Retries the primary connection and drains the offline spool once it
//! returns. Delayed reconnection attempts are not fire-and-forget: callers
//! submit commands over a channel to a worker task, and the worker's
//! `JoinSet` scopes every pending attempt to its own lifetime. Dropping the
//! last handle shuts the worker down and aborts whatever is still waiting.

use crate::database::PrimaryStore;
use crate::resilience::health::HealthState;
use crate::spool::OfflineSpool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorCommand {
    /// Attempt a reconnection after the given delay.
    ReconnectAfter(Duration),
    /// Drain the offline spool into the primary store now.
    Drain,
}

/// Cheap cloneable submission side of the coordinator worker.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    tx: UnboundedSender<CoordinatorCommand>,
}

impl CoordinatorHandle {
    /// Create a handle and the receiving end it feeds. Production code gets
    /// this pair from [`ReconnectCoordinator::spawn`]; tests use it to
    /// observe submissions directly.
    pub fn channel() -> (Self, UnboundedReceiver<CoordinatorCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Submit a delayed reconnection attempt. Never blocks.
    pub fn schedule_reconnect(&self, delay: Duration) {
        if self.tx.send(CoordinatorCommand::ReconnectAfter(delay)).is_err() {
            debug!("Coordinator worker gone, dropping reconnect request");
        }
    }

    /// Submit a spool drain. Never blocks.
    pub fn request_drain(&self) {
        if self.tx.send(CoordinatorCommand::Drain).is_err() {
            debug!("Coordinator worker gone, dropping drain request");
        }
    }
}

/// Owns the reconnect/drain logic shared by the worker and the operator
/// endpoint.
pub struct ReconnectCoordinator<S> {
    store: Arc<S>,
    state: Arc<HealthState>,
    spool: Arc<OfflineSpool>,
}

impl<S: PrimaryStore> ReconnectCoordinator<S> {
    pub fn new(store: Arc<S>, state: Arc<HealthState>, spool: Arc<OfflineSpool>) -> Self {
        Self {
            store,
            state,
            spool,
        }
    }

    /// Lightweight open/close round-trip against the primary store.
    ///
    /// On success the health state flips to healthy (stamping the check
    /// time) and the spool drains. On failure the state is left unchanged so
    /// the next scheduled or manual attempt can retry. Safe to call while
    /// already healthy - it simply re-confirms.
    pub async fn try_reconnect(&self) -> bool {
        info!("Attempting primary store reconnection");

        match self.store.connection_test().await {
            Ok(()) => {
                self.state.mark_healthy();
                info!("Primary store reconnection successful");
                self.drain_spool().await;
                true
            }
            Err(err) => {
                error!(error = %err, "Primary store reconnection failed");
                false
            }
        }
    }

    /// Drain the spool, logging the outcome. Spool-level failures stay here;
    /// the records themselves are safe on disk for the next pass.
    pub async fn drain_spool(&self) {
        match self.spool.drain(self.store.as_ref()).await {
            Ok(report) => {
                if report.replayed > 0 || report.deferred > 0 {
                    info!(
                        replayed = report.replayed,
                        deferred = report.deferred,
                        "Offline spool synced"
                    );
                }
            }
            Err(err) => {
                error!(error = %err, "Offline spool drain failed");
            }
        }
    }

    /// Start the worker task. Returns the submission handle and the worker's
    /// join handle. The worker exits once every handle clone is dropped,
    /// aborting any reconnection attempts still sleeping in its `JoinSet`.
    pub fn spawn(self: Arc<Self>) -> (CoordinatorHandle, JoinHandle<()>) {
        let (handle, mut rx) = CoordinatorHandle::channel();

        let worker = tokio::spawn(async move {
            let mut attempts: JoinSet<()> = JoinSet::new();

            loop {
                tokio::select! {
                    command = rx.recv() => match command {
                        Some(CoordinatorCommand::ReconnectAfter(delay)) => {
                            debug!(delay_seconds = delay.as_secs(), "Reconnection attempt scheduled");
                            let coordinator = Arc::clone(&self);
                            attempts.spawn(async move {
                                tokio::time::sleep(delay).await;
                                coordinator.try_reconnect().await;
                            });
                        }
                        Some(CoordinatorCommand::Drain) => {
                            self.drain_spool().await;
                        }
                        None => break,
                    },
                    Some(_) = attempts.join_next(), if !attempts.is_empty() => {}
                }
            }

            attempts.shutdown().await;
            debug!("Coordinator worker stopped");
        });

        (handle, worker)
    }
}
