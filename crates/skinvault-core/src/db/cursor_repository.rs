//! Sync cursor repository implementation

use crate::error::Result;
use crate::models::SyncCursor;
use libsql::Connection;

const LAST_PUSH_KEY: &str = "last_push_at";
const LAST_PULL_KEY: &str = "last_pull_at";

/// Trait for sync cursor storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SyncCursorRepository {
    /// Load the cursor; unset timestamps are `None`
    async fn load(&self) -> Result<SyncCursor>;

    /// Save the cursor
    async fn save(&self, cursor: &SyncCursor) -> Result<()>;
}

/// libSQL implementation of `SyncCursorRepository`
pub struct LibSqlSyncCursorRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSyncCursorRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SyncCursorRepository for LibSqlSyncCursorRepository<'_> {
    async fn load(&self) -> Result<SyncCursor> {
        Ok(SyncCursor {
            last_push_at: self.get_timestamp(LAST_PUSH_KEY).await?,
            last_pull_at: self.get_timestamp(LAST_PULL_KEY).await?,
        })
    }

    async fn save(&self, cursor: &SyncCursor) -> Result<()> {
        self.set_timestamp(LAST_PUSH_KEY, cursor.last_push_at)
            .await?;
        self.set_timestamp(LAST_PULL_KEY, cursor.last_pull_at)
            .await?;
        Ok(())
    }
}

impl LibSqlSyncCursorRepository<'_> {
    async fn get_timestamp(&self, key: &str) -> Result<Option<i64>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM sync_state WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            let value: String = row.get(0)?;
            Ok(value.trim().parse().ok())
        } else {
            Ok(None)
        }
    }

    async fn set_timestamp(&self, key: &str, value: Option<i64>) -> Result<()> {
        match value {
            Some(timestamp) => {
                self.conn
                    .execute(
                        "INSERT OR REPLACE INTO sync_state (key, value) VALUES (?, ?)",
                        [key, timestamp.to_string().as_str()],
                    )
                    .await?;
            }
            None => {
                self.conn
                    .execute("DELETE FROM sync_state WHERE key = ?", [key])
                    .await?;
            }
        }
        Ok(())
    }
}
