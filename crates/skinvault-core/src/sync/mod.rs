//! Offline-first reconciliation between the local replica and the remote
//! authority.
//!
//! [`ReconciliationController`] owns the connectivity state machine and the
//! push/pull passes; [`ConnectivityMonitor`] drives it from liveness probes
//! and external connectivity hints.

mod controller;
mod merge;
mod monitor;

pub use controller::{ReconcileSummary, ReconciliationController};
pub use merge::{apply_pending_status, merge_inventory, MergeReport};
pub use monitor::{ConnectivityHint, ConnectivityMonitor, MonitorHandle};

use crate::models::OpId;
use crate::state::ConnectivityState;

/// Notifications emitted by the reconciliation engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// Connectivity state changed
    StateChanged {
        from: ConnectivityState,
        to: ConnectivityState,
    },
    /// A queued offline draw was acknowledged by the remote
    OperationCommitted { op_id: OpId, skin_id: String },
    /// The remote refused a queued offline draw; it was dropped from the log
    OperationRejected {
        op_id: OpId,
        skin_id: String,
        reason: String,
    },
    /// The push phase stopped early; the remaining operations stay queued
    PushAborted { remaining: usize, reason: String },
    /// Remote inventory was merged into the local snapshot
    PullCompleted { report: MergeReport },
    PullFailed { reason: String },
    /// Catalog cache refreshed from the remote
    CatalogRefreshed { cases: usize },
}
