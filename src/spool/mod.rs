//! # Local Durable Spool
//!
//! Per-tenant append-only file storage for data that could not reach the
//! primary store. Each owner gets a partition directory; every offline write
//! lands as a new timestamped JSON record, and a drain replays unsynced
//! records into the primary store before moving them to a `synced/`
//! sub-partition. Records are never deleted - the synced partition is the
//! audit trail.
//!
//! Same-owner writes are serialized through a per-owner async lock so a
//! partition's record set stays ordered; different owners never contend.

pub mod record;

use crate::database::PrimaryStore;
use dashmap::DashMap;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

pub use record::SpooledRecord;

const SYNCED_DIR: &str = "synced";

#[derive(Debug, Error)]
pub enum SpoolError {
    #[error("Spool I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spool serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid record kind: {0:?}")]
    InvalidKind(String),
}

/// Outcome of a drain pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Records replayed into the primary store and moved to `synced/`.
    pub replayed: usize,
    /// Records left in place for the next drain after a replay failure.
    pub deferred: usize,
}

pub struct OfflineSpool {
    root: PathBuf,
    owner_locks: DashMap<Uuid, Arc<Mutex<()>>>,
    sequence: AtomicU64,
}

impl OfflineSpool {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, SpoolError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;

        Ok(Self {
            root,
            owner_locks: DashMap::new(),
            sequence: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn owner_lock(&self, owner_id: Uuid) -> Arc<Mutex<()>> {
        self.owner_locks
            .entry(owner_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn owner_dir(&self, owner_id: Uuid) -> PathBuf {
        self.root.join(owner_id.to_string())
    }

    /// Append a new record under the owner's partition.
    pub async fn write(
        &self,
        owner_id: Uuid,
        kind: &str,
        payload: Value,
    ) -> Result<(), SpoolError> {
        if kind.is_empty() || !kind.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(SpoolError::InvalidKind(kind.to_string()));
        }

        let lock = self.owner_lock(owner_id);
        let _guard = lock.lock().await;

        let owner_dir = self.owner_dir(owner_id);
        tokio::fs::create_dir_all(&owner_dir).await?;

        let record = SpooledRecord::new(owner_id, kind, payload);
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let file_name = record::record_file_name(kind, record.created_at, sequence);

        let bytes = serde_json::to_vec_pretty(&record)?;
        tokio::fs::write(owner_dir.join(&file_name), bytes).await?;

        info!(owner_id = %owner_id, file = %file_name, "Saved offline record");
        Ok(())
    }

    /// Most recently created unsynced record of `kind` for the owner, or
    /// `Ok(None)` when the partition holds none. Spool I/O failures surface
    /// as `Err`, distinct from "no data".
    pub async fn read_latest(
        &self,
        owner_id: Uuid,
        kind: &str,
    ) -> Result<Option<Value>, SpoolError> {
        let lock = self.owner_lock(owner_id);
        let _guard = lock.lock().await;

        let owner_dir = self.owner_dir(owner_id);
        if !owner_dir.exists() {
            return Ok(None);
        }

        let mut latest: Option<(String, String)> = None;
        let mut entries = tokio::fs::read_dir(&owner_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some((record_kind, sort_key)) = record::parse_file_name(&name) else {
                continue;
            };
            if record_kind != kind {
                continue;
            }
            if latest.as_ref().map_or(true, |(key, _)| sort_key > key.as_str()) {
                latest = Some((sort_key.to_string(), name));
            }
        }

        let Some((_, file_name)) = latest else {
            return Ok(None);
        };

        let bytes = tokio::fs::read(owner_dir.join(file_name)).await?;
        let record: SpooledRecord = serde_json::from_slice(&bytes)?;
        Ok(Some(record.payload))
    }

    /// Replay every unsynced record into the primary store, oldest first per
    /// owner, moving each replayed record to the `synced/` sub-partition.
    ///
    /// A replay failure defers the failing record and the rest of that
    /// owner's queue (ordering within a partition is preserved); other owners
    /// still drain. A second drain over a fully-drained spool is a no-op.
    pub async fn drain<S: PrimaryStore>(&self, store: &S) -> Result<DrainReport, SpoolError> {
        let mut report = DrainReport::default();

        let mut partitions = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = partitions.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Some(owner_id) = entry
                .file_name()
                .to_str()
                .and_then(|name| Uuid::parse_str(name).ok())
            else {
                continue;
            };

            let (replayed, deferred) = self.drain_owner(store, owner_id, entry.path()).await?;
            report.replayed += replayed;
            report.deferred += deferred;
        }

        info!(
            replayed = report.replayed,
            deferred = report.deferred,
            "Offline spool drain complete"
        );
        Ok(report)
    }

    async fn drain_owner<S: PrimaryStore>(
        &self,
        store: &S,
        owner_id: Uuid,
        owner_dir: PathBuf,
    ) -> Result<(usize, usize), SpoolError> {
        let lock = self.owner_lock(owner_id);
        let _guard = lock.lock().await;

        let mut pending: Vec<(String, String)> = Vec::new();
        let mut entries = tokio::fs::read_dir(&owner_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some((_, sort_key)) = record::parse_file_name(&name) {
                pending.push((sort_key.to_string(), name));
            }
        }
        pending.sort();

        let mut replayed = 0;
        for (index, (_, file_name)) in pending.iter().enumerate() {
            let path = owner_dir.join(file_name);

            let outcome = async {
                let bytes = tokio::fs::read(&path).await?;
                let record: SpooledRecord = serde_json::from_slice(&bytes)?;
                Ok::<SpooledRecord, SpoolError>(record)
            }
            .await;

            let mut record = match outcome {
                Ok(record) => record,
                Err(err) => {
                    warn!(
                        owner_id = %owner_id,
                        file = %file_name,
                        error = %err,
                        "Unreadable spool record, deferring owner partition"
                    );
                    return Ok((replayed, pending.len() - index));
                }
            };

            if let Err(err) = store.apply_spooled(&record).await {
                warn!(
                    owner_id = %owner_id,
                    file = %file_name,
                    error = %err,
                    "Replay failed, leaving records for next drain"
                );
                return Ok((replayed, pending.len() - index));
            }

            record.synced = true;
            let synced_dir = owner_dir.join(SYNCED_DIR);
            tokio::fs::create_dir_all(&synced_dir).await?;
            tokio::fs::write(
                synced_dir.join(file_name),
                serde_json::to_vec_pretty(&record)?,
            )
            .await?;
            tokio::fs::remove_file(&path).await?;
            replayed += 1;
        }

        Ok((replayed, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{PrimaryStore, StoreError};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    #[derive(Default)]
    struct RecordingStore {
        replayed: parking_lot::Mutex<Vec<SpooledRecord>>,
        fail_replay: AtomicBool,
    }

    #[async_trait]
    impl PrimaryStore for RecordingStore {
        async fn probe(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn connection_test(&self) -> Result<(), StoreError> {
            Ok(())
        }

        async fn apply_spooled(&self, record: &SpooledRecord) -> Result<(), StoreError> {
            if self.fail_replay.load(Ordering::SeqCst) {
                return Err(StoreError::Io("replay rejected".to_string()));
            }
            self.replayed.lock().push(record.clone());
            Ok(())
        }
    }

    fn spool() -> (tempfile::TempDir, OfflineSpool) {
        let dir = tempfile::tempdir().unwrap();
        let spool = OfflineSpool::new(dir.path().join("spool")).unwrap();
        (dir, spool)
    }

    #[tokio::test]
    async fn test_read_latest_returns_most_recent_write() {
        let (_dir, spool) = spool();
        let owner = Uuid::new_v4();

        spool.write(owner, "business", json!({"name": "first"})).await.unwrap();
        spool.write(owner, "business", json!({"name": "second"})).await.unwrap();
        spool.write(owner, "business", json!({"name": "third"})).await.unwrap();

        let latest = spool.read_latest(owner, "business").await.unwrap();
        assert_eq!(latest, Some(json!({"name": "third"})));
    }

    #[tokio::test]
    async fn test_read_latest_matches_kind_exactly() {
        let (_dir, spool) = spool();
        let owner = Uuid::new_v4();

        spool
            .write(owner, "business_list", json!({"items": []}))
            .await
            .unwrap();

        assert_eq!(spool.read_latest(owner, "business").await.unwrap(), None);
        assert!(spool
            .read_latest(owner, "business_list")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_read_latest_empty_partition() {
        let (_dir, spool) = spool();
        let latest = spool.read_latest(Uuid::new_v4(), "business").await.unwrap();
        assert_eq!(latest, None);
    }

    #[tokio::test]
    async fn test_write_rejects_path_like_kind() {
        let (_dir, spool) = spool();
        let result = spool.write(Uuid::new_v4(), "../escape", json!({})).await;
        assert!(matches!(result, Err(SpoolError::InvalidKind(_))));
    }

    #[tokio::test]
    async fn test_drain_replays_in_creation_order_and_moves_to_synced() {
        let (_dir, spool) = spool();
        let owner = Uuid::new_v4();
        let store = RecordingStore::default();

        for i in 0..3 {
            spool.write(owner, "product", json!({ "seq": i })).await.unwrap();
        }

        let report = spool.drain(&store).await.unwrap();
        assert_eq!(report, DrainReport { replayed: 3, deferred: 0 });

        let replayed = store.replayed.lock().clone();
        let sequence: Vec<_> = replayed.iter().map(|r| r.payload["seq"].clone()).collect();
        assert_eq!(sequence, vec![json!(0), json!(1), json!(2)]);
        assert!(replayed.iter().all(|r| !r.synced));

        // Unsynced partition is empty; records live on under synced/.
        assert_eq!(spool.read_latest(owner, "product").await.unwrap(), None);
        let synced_dir = spool.root().join(owner.to_string()).join(SYNCED_DIR);
        assert_eq!(std::fs::read_dir(&synced_dir).unwrap().count(), 3);
    }

    #[tokio::test]
    async fn test_drain_is_idempotent() {
        let (_dir, spool) = spool();
        let owner = Uuid::new_v4();
        let store = RecordingStore::default();

        spool.write(owner, "business", json!({"name": "solo"})).await.unwrap();

        let first = spool.drain(&store).await.unwrap();
        let second = spool.drain(&store).await.unwrap();

        assert_eq!(first.replayed, 1);
        assert_eq!(second, DrainReport { replayed: 0, deferred: 0 });
        assert_eq!(store.replayed.lock().len(), 1);

        let synced_dir = spool.root().join(owner.to_string()).join(SYNCED_DIR);
        assert_eq!(std::fs::read_dir(&synced_dir).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_failed_replay_defers_records_without_losing_them() {
        let (_dir, spool) = spool();
        let owner = Uuid::new_v4();
        let store = RecordingStore::default();
        store.fail_replay.store(true, Ordering::SeqCst);

        spool.write(owner, "business", json!({"name": "kept"})).await.unwrap();

        let report = spool.drain(&store).await.unwrap();
        assert_eq!(report, DrainReport { replayed: 0, deferred: 1 });

        // Record still readable, and a later drain picks it up.
        assert!(spool.read_latest(owner, "business").await.unwrap().is_some());

        store.fail_replay.store(false, Ordering::SeqCst);
        let retry = spool.drain(&store).await.unwrap();
        assert_eq!(retry.replayed, 1);
    }

    #[tokio::test]
    async fn test_concurrent_same_owner_writes_all_land() {
        let (_dir, spool) = spool();
        let spool = Arc::new(spool);
        let owner = Uuid::new_v4();
        let in_flight = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..8 {
            let spool = Arc::clone(&spool);
            let in_flight = Arc::clone(&in_flight);
            handles.push(tokio::spawn(async move {
                spool.write(owner, "product", json!({ "seq": i })).await.unwrap();
                in_flight.fetch_add(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(in_flight.load(Ordering::SeqCst), 8);
        let store = RecordingStore::default();
        let report = spool.drain(&store).await.unwrap();
        assert_eq!(report.replayed, 8);
    }
}
