//! Shared replica service wrapper used across clients.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::db::{
    Database, LibSqlPendingLog, LibSqlReplicaStore, LibSqlSyncCursorRepository, PendingLog,
    ReplicaStore, SyncCursorRepository,
};
use crate::models::{
    Case, CaseDetail, InventoryEntry, InventorySnapshot, OpId, PendingOperation, Skin, SyncCursor,
};
use crate::remote::RemoteInventoryItem;
use crate::sync::{apply_pending_status, merge_inventory, MergeReport};
use crate::Result;

/// Thread-safe service over the local replica.
#[derive(Clone)]
pub struct ReplicaService {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl ReplicaService {
    /// Open the replica at the given filesystem path.
    ///
    /// A file that is not a database is moved aside and a fresh replica is
    /// created in its place.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = match Database::open(&db_path).await {
            Ok(db) => db,
            Err(error) if Self::is_corrupted_db_error(&error) => {
                tracing::warn!(
                    "Local replica at {} is unreadable: {}. Quarantining and starting fresh.",
                    db_path.display(),
                    error
                );
                Self::quarantine_corrupted_db_files(&db_path)?;
                Database::open(&db_path).await?
            }
            Err(error) => return Err(error),
        };

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory replica (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn is_corrupted_db_error(error: &crate::Error) -> bool {
        let message = error.to_string().to_ascii_lowercase();
        message.contains("file is not a database") || message.contains("malformed")
    }

    fn quarantine_corrupted_db_files(db_path: &Path) -> Result<()> {
        let Some(base_name) = db_path.file_name().and_then(|name| name.to_str()) else {
            return Ok(());
        };

        if db_path.exists() {
            let timestamp = chrono::Utc::now().timestamp_millis();
            let backup_path = db_path.with_file_name(format!("{base_name}.corrupt-{timestamp}"));

            std::fs::rename(db_path, &backup_path)?;
            tracing::warn!(
                "Moved corrupted local DB file from {} to {}",
                db_path.display(),
                backup_path.display()
            );
        }

        let Some(parent) = db_path.parent() else {
            return Ok(());
        };
        let sidecar_prefix = format!("{base_name}-");

        for entry in std::fs::read_dir(parent)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if file_name.starts_with(&sidecar_prefix) {
                let path = entry.path();
                std::fs::remove_file(&path)?;
                tracing::warn!("Removed stale local replica file {}", path.display());
            }
        }

        Ok(())
    }

    /// Cases in the catalog cache, ordered by id.
    pub async fn cached_cases(&self) -> Result<Vec<Case>> {
        let db = self.db.lock().await;
        let store = LibSqlReplicaStore::new(db.connection());
        store.list::<Case>().await
    }

    /// A cached case with every cached skin it can yield.
    pub async fn case_detail(&self, case_id: &str) -> Result<Option<CaseDetail>> {
        let db = self.db.lock().await;
        let store = LibSqlReplicaStore::new(db.connection());
        let Some(case) = store.get::<Case>(case_id).await? else {
            return Ok(None);
        };
        let skins = store
            .list::<Skin>()
            .await?
            .into_iter()
            .filter(|skin| skin.case_id == case.id)
            .collect();
        Ok(Some(CaseDetail { case, skins }))
    }

    /// Cache a case and its skins.
    pub async fn cache_case_detail(&self, detail: &CaseDetail) -> Result<()> {
        let db = self.db.lock().await;
        let store = LibSqlReplicaStore::new(db.connection());
        store.put_all(std::slice::from_ref(&detail.case)).await?;
        store.put_all(&detail.skins).await?;
        Ok(())
    }

    /// A user's inventory; empty when nothing was stored yet.
    pub async fn inventory(&self, user_id: &str) -> Result<InventorySnapshot> {
        let db = self.db.lock().await;
        let store = LibSqlReplicaStore::new(db.connection());
        Ok(store
            .get_inventory(user_id)
            .await?
            .unwrap_or_else(|| InventorySnapshot::new(user_id)))
    }

    /// Add an entry acknowledged by the remote.
    pub async fn record_synced_entry(
        &self,
        user_id: &str,
        entry: InventoryEntry,
    ) -> Result<InventorySnapshot> {
        let db = self.db.lock().await;
        let store = LibSqlReplicaStore::new(db.connection());
        let mut snapshot = store
            .get_inventory(user_id)
            .await?
            .unwrap_or_else(|| InventorySnapshot::new(user_id));
        snapshot.upsert(entry);
        store.put_inventory(&snapshot).await?;
        Ok(snapshot)
    }

    /// Queue an offline draw and add its pending entry in one transaction.
    ///
    /// The entry the draw overwrites is kept on the queued operation so a
    /// rejection can put it back.
    pub async fn record_offline_draw(
        &self,
        op: &PendingOperation,
        entry: InventoryEntry,
    ) -> Result<InventorySnapshot> {
        let db = self.db.lock().await;
        let conn = db.connection();
        let store = LibSqlReplicaStore::new(conn);
        let log = LibSqlPendingLog::new(conn);

        conn.execute("BEGIN TRANSACTION", ()).await?;
        let result = async {
            let mut snapshot = store
                .get_inventory(&op.user_id)
                .await?
                .unwrap_or_else(|| InventorySnapshot::new(op.user_id.as_str()));

            let previous_entry = match snapshot.get(&op.skin.id) {
                // Another queued draw already replaced it; inherit what that one saw.
                Some(existing) if existing.is_pending() => log
                    .list_pending(&op.user_id)
                    .await?
                    .into_iter()
                    .rev()
                    .find(|queued| queued.skin.id == op.skin.id)
                    .and_then(|queued| queued.previous_entry),
                existing => existing.cloned(),
            };
            let mut op = op.clone();
            op.previous_entry = previous_entry;
            log.append(&op).await?;

            snapshot.upsert(entry);
            store.put_inventory(&snapshot).await?;
            Ok::<_, crate::Error>(snapshot)
        }
        .await;

        match result {
            Ok(snapshot) => {
                if let Err(error) = conn.execute("COMMIT", ()).await {
                    conn.execute("ROLLBACK", ()).await.ok();
                    return Err(error.into());
                }
                Ok(snapshot)
            }
            Err(error) => {
                conn.execute("ROLLBACK", ()).await.ok();
                Err(error)
            }
        }
    }

    /// Re-derive entry sync status from the log; returns the queued operations.
    pub async fn refresh_pending_status(&self, user_id: &str) -> Result<Vec<PendingOperation>> {
        let db = self.db.lock().await;
        let store = LibSqlReplicaStore::new(db.connection());
        let log = LibSqlPendingLog::new(db.connection());

        let queued = log.list_pending(user_id).await?;
        let mut snapshot = store
            .get_inventory(user_id)
            .await?
            .unwrap_or_else(|| InventorySnapshot::new(user_id));
        if apply_pending_status(&mut snapshot, queued.iter().map(|op| op.skin.id.as_str())) {
            store.put_inventory(&snapshot).await?;
        }
        Ok(queued)
    }

    /// Undo the local effect of operations the remote refused.
    ///
    /// A pending entry no other queued draw covers goes back to what the draw
    /// replaced, or disappears if the skin was not owned before.
    pub async fn discard_rejected(
        &self,
        user_id: &str,
        rejected: &[PendingOperation],
    ) -> Result<()> {
        let db = self.db.lock().await;
        let store = LibSqlReplicaStore::new(db.connection());
        let log = LibSqlPendingLog::new(db.connection());

        let still_queued: HashSet<String> = log
            .list_pending(user_id)
            .await?
            .into_iter()
            .map(|op| op.skin.id)
            .collect();
        let mut snapshot = store
            .get_inventory(user_id)
            .await?
            .unwrap_or_else(|| InventorySnapshot::new(user_id));

        let mut changed = false;
        for op in rejected {
            let pending_only = snapshot
                .get(&op.skin.id)
                .is_some_and(|entry| entry.is_pending() && !still_queued.contains(&op.skin.id));
            if !pending_only {
                continue;
            }
            match op.previous_entry.clone() {
                Some(previous) => snapshot.upsert(previous),
                None => {
                    snapshot.remove(&op.skin.id);
                }
            }
            changed = true;
        }

        if changed {
            store.put_inventory(&snapshot).await?;
        }
        Ok(())
    }

    /// Merge pulled items into the stored inventory.
    ///
    /// Load, merge and save happen under one lock, and pending status comes
    /// from the log as it is at save time.
    pub async fn merge_pull(
        &self,
        user_id: &str,
        items: &[RemoteInventoryItem],
        pulled_at: i64,
    ) -> Result<(InventorySnapshot, MergeReport)> {
        let db = self.db.lock().await;
        let store = LibSqlReplicaStore::new(db.connection());
        let log = LibSqlPendingLog::new(db.connection());

        let local = store
            .get_inventory(user_id)
            .await?
            .unwrap_or_else(|| InventorySnapshot::new(user_id));
        let (mut merged, report) = merge_inventory(&local, items, pulled_at);
        let queued = log.list_pending(user_id).await?;
        apply_pending_status(&mut merged, queued.iter().map(|op| op.skin.id.as_str()));
        store.put_inventory(&merged).await?;
        Ok((merged, report))
    }

    /// Queued operations of a user, oldest first.
    pub async fn pending_operations(&self, user_id: &str) -> Result<Vec<PendingOperation>> {
        let db = self.db.lock().await;
        let log = LibSqlPendingLog::new(db.connection());
        log.list_pending(user_id).await
    }

    pub async fn pending_count(&self, user_id: &str) -> Result<usize> {
        let db = self.db.lock().await;
        let log = LibSqlPendingLog::new(db.connection());
        log.count(user_id).await
    }

    /// Drop an operation from the log.
    pub async fn remove_pending(&self, op_id: &OpId) -> Result<bool> {
        let db = self.db.lock().await;
        let log = LibSqlPendingLog::new(db.connection());
        log.remove(op_id).await
    }

    pub async fn record_pending_failure(&self, op_id: &OpId, message: &str) -> Result<()> {
        let db = self.db.lock().await;
        let log = LibSqlPendingLog::new(db.connection());
        log.record_failure(op_id, message).await
    }

    pub async fn load_cursor(&self) -> Result<SyncCursor> {
        let db = self.db.lock().await;
        let repo = LibSqlSyncCursorRepository::new(db.connection());
        repo.load().await
    }

    pub async fn save_cursor(&self, cursor: &SyncCursor) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlSyncCursorRepository::new(db.connection());
        repo.save(cursor).await
    }
}
