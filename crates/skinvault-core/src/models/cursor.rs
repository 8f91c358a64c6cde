//! Sync cursor model

use serde::{Deserialize, Serialize};

/// Process-wide synchronization timestamps (Unix ms).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCursor {
    /// Last push phase that committed at least one operation
    pub last_push_at: Option<i64>,
    /// Start of the last successful pull; bounds the next incremental fetch
    pub last_pull_at: Option<i64>,
}
