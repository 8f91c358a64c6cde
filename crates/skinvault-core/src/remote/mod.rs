//! Remote authority interface
//!
//! The remote authority is the canonical owner of inventory state. The
//! reconciliation engine only talks to it through [`RemoteAuthority`]; the
//! HTTP binding lives in [`http`].

pub mod http;
#[cfg(test)]
pub(crate) mod memory;
mod wire;

pub use http::HttpRemoteAuthority;

use crate::error::Result;
use crate::models::{CaseDetail, CaseSummary, PendingOperation, Skin};

/// Outcome of a draw performed and committed by the remote authority.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDraw {
    pub skin: Skin,
    pub sample: f64,
    pub rarity: String,
}

/// One owned skin as reported by the remote authority.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteInventoryItem {
    pub skin_id: String,
    pub name: String,
    pub rarity: String,
    pub image_ref: String,
    pub cost: f64,
    pub case_id: Option<String>,
    /// Acquisition timestamp (Unix ms) when the remote reports one
    pub acquired_at: Option<i64>,
}

/// Inventory as returned by a (possibly incremental) fetch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RemoteInventory {
    pub total_count: usize,
    pub total_value: f64,
    pub items: Vec<RemoteInventoryItem>,
}

/// Operations consumed from the remote authority.
///
/// Contract: `commit_offline_draw` must be idempotent by `op.op_id`;
/// replaying an already applied operation acknowledges without applying it
/// twice. Implementations classify failures as
/// [`Error::NetworkUnavailable`](crate::Error::NetworkUnavailable) (retry),
/// [`Error::RemoteRejected`](crate::Error::RemoteRejected) (permanent), or
/// [`Error::Unauthorized`](crate::Error::Unauthorized).
#[allow(async_fn_in_trait)]
pub trait RemoteAuthority {
    /// Lightweight reachability check
    async fn liveness_probe(&self) -> Result<()>;

    /// Draw and commit on the remote
    async fn submit_draw(&self, case_id: &str, user_id: &str) -> Result<RemoteDraw>;

    /// Commit a draw that was resolved locally while offline
    async fn commit_offline_draw(&self, op: &PendingOperation) -> Result<()>;

    /// Fetch inventory, only entries updated after `since` when given
    async fn fetch_inventory(&self, user_id: &str, since: Option<i64>) -> Result<RemoteInventory>;

    /// List available cases
    async fn fetch_cases(&self) -> Result<Vec<CaseSummary>>;

    /// Fetch a case with its rarity table and skins
    async fn fetch_case(&self, case_id: &str) -> Result<CaseDetail>;
}
