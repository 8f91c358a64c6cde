//! Pending-operation log implementation

use libsql::Connection;

use crate::error::{Error, Result};
use crate::models::{OpId, PendingOperation};
use crate::util::now_millis;

/// Trait for the durable queue of offline inventory mutations (async)
#[allow(async_fn_in_trait)]
pub trait PendingLog {
    /// Append an operation; appending an id that is already queued is a no-op
    async fn append(&self, op: &PendingOperation) -> Result<OpId>;

    /// Operations of a user in insertion order (oldest first)
    async fn list_pending(&self, user_id: &str) -> Result<Vec<PendingOperation>>;

    /// Remove an acknowledged operation; returns whether it was queued
    async fn remove(&self, op_id: &OpId) -> Result<bool>;

    /// Record a failed submission attempt
    async fn record_failure(&self, op_id: &OpId, message: &str) -> Result<()>;

    /// Number of queued operations for a user
    async fn count(&self, user_id: &str) -> Result<usize>;
}

/// libSQL implementation of `PendingLog`
pub struct LibSqlPendingLog<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlPendingLog<'a> {
    /// Create a new log with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_operation(row: &libsql::Row) -> Result<PendingOperation> {
        let op_id: String = row.get(0)?;
        let skin_payload: String = row.get(3)?;
        let last_error: Option<String> = row.get(7)?;
        let previous_entry = row
            .get::<Option<String>>(8)?
            .map(|payload| serde_json::from_str(&payload))
            .transpose()?;
        Ok(PendingOperation {
            op_id: op_id
                .parse()
                .map_err(|_| Error::Database(format!("invalid operation id '{op_id}'")))?,
            user_id: row.get(1)?,
            case_id: row.get(2)?,
            skin: serde_json::from_str(&skin_payload)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
            attempts: u32::try_from(row.get::<i64>(6)?).unwrap_or(u32::MAX),
            last_error,
            previous_entry,
        })
    }
}

impl PendingLog for LibSqlPendingLog<'_> {
    async fn append(&self, op: &PendingOperation) -> Result<OpId> {
        let skin_payload = serde_json::to_string(&op.skin)?;
        let previous_entry = op
            .previous_entry
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let inserted = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO pending_operations
                    (op_id, user_id, case_id, skin_payload, created_at, updated_at, attempts,
                     last_error, previous_entry)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                libsql::params![
                    op.op_id.as_str(),
                    op.user_id.as_str(),
                    op.case_id.as_str(),
                    skin_payload,
                    op.created_at,
                    op.updated_at,
                    i64::from(op.attempts),
                    op.last_error.clone(),
                    previous_entry
                ],
            )
            .await?;

        if inserted == 0 {
            tracing::debug!("Pending operation {} already queued", op.op_id);
        } else {
            tracing::debug!("Queued pending operation {} for case {}", op.op_id, op.case_id);
        }
        Ok(op.op_id)
    }

    async fn list_pending(&self, user_id: &str) -> Result<Vec<PendingOperation>> {
        let mut rows = self
            .conn
            .query(
                "SELECT op_id, user_id, case_id, skin_payload, created_at, updated_at, attempts,
                        last_error, previous_entry
                 FROM pending_operations
                 WHERE user_id = ?
                 ORDER BY seq ASC",
                [user_id],
            )
            .await?;

        let mut operations = Vec::new();
        while let Some(row) = rows.next().await? {
            operations.push(Self::parse_operation(&row)?);
        }
        Ok(operations)
    }

    async fn remove(&self, op_id: &OpId) -> Result<bool> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM pending_operations WHERE op_id = ?",
                [op_id.as_str()],
            )
            .await?;
        Ok(removed > 0)
    }

    async fn record_failure(&self, op_id: &OpId, message: &str) -> Result<()> {
        self.conn
            .execute(
                "UPDATE pending_operations
                 SET attempts = attempts + 1, last_error = ?, updated_at = ?
                 WHERE op_id = ?",
                libsql::params![message, now_millis(), op_id.as_str()],
            )
            .await?;
        Ok(())
    }

    async fn count(&self, user_id: &str) -> Result<usize> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM pending_operations WHERE user_id = ?",
                [user_id],
            )
            .await?;

        let count = match rows.next().await? {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::{InventoryEntry, Skin, SyncStatus};

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn op(user_id: &str, skin_id: &str, created_at: i64) -> PendingOperation {
        PendingOperation::new(
            user_id,
            "case-1",
            Skin {
                id: skin_id.to_string(),
                name: format!("Skin {skin_id}"),
                rarity: "Covert".to_string(),
                image_ref: String::new(),
                cost: 9.5,
                case_id: "case-1".to_string(),
            },
            created_at,
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn list_preserves_insertion_order() {
        let db = setup().await;
        let log = LibSqlPendingLog::new(db.connection());

        log.append(&op("u1", "late", 300)).await.unwrap();
        log.append(&op("u1", "early", 100)).await.unwrap();
        log.append(&op("u2", "other", 200)).await.unwrap();

        let pending = log.list_pending("u1").await.unwrap();
        let ids = pending.iter().map(|op| op.skin.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["late", "early"]);
        assert_eq!(log.count("u2").await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn re_append_is_idempotent() {
        let db = setup().await;
        let log = LibSqlPendingLog::new(db.connection());

        let operation = op("u1", "s1", 100);
        let first = log.append(&operation).await.unwrap();
        let second = log.append(&operation).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(log.count("u1").await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn remove_and_record_failure() {
        let db = setup().await;
        let log = LibSqlPendingLog::new(db.connection());

        let operation = op("u1", "s1", 100);
        log.append(&operation).await.unwrap();
        log.record_failure(&operation.op_id, "timeout").await.unwrap();

        let pending = log.list_pending("u1").await.unwrap();
        assert_eq!(pending[0].attempts, 1);
        assert_eq!(pending[0].last_error.as_deref(), Some("timeout"));
        assert_eq!(pending[0].skin, operation.skin);

        assert_eq!(pending[0].previous_entry, None);

        assert!(log.remove(&operation.op_id).await.unwrap());
        assert!(!log.remove(&operation.op_id).await.unwrap());
        assert_eq!(log.count("u1").await.unwrap(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn previous_entry_survives_storage() {
        let db = setup().await;
        let log = LibSqlPendingLog::new(db.connection());

        let mut operation = op("u1", "s1", 100);
        let owned = InventoryEntry::from_skin(&operation.skin, 50, SyncStatus::Synced);
        operation.previous_entry = Some(owned.clone());
        log.append(&operation).await.unwrap();

        let pending = log.list_pending("u1").await.unwrap();
        assert_eq!(pending[0].previous_entry, Some(owned));
    }
}
