//! skinvault-core - Core library for skinvault
//!
//! This crate contains the weighted draw engine, the local replica (catalog
//! cache, inventory snapshot, pending-operation log, sync cursor), the remote
//! authority client, and the reconciliation engine shared by every skinvault
//! interface.

pub mod config;
pub mod db;
pub mod draw;
pub mod error;
pub mod export;
pub mod models;
pub mod remote;
pub mod services;
pub mod state;
pub mod sync;
pub mod util;

pub use config::ClientConfig;
pub use error::{Error, Result};
pub use models::{
    Case, CaseDetail, CaseSummary, DrawOutcome, InventoryEntry, InventorySnapshot, OpId,
    PendingOperation, RarityTable, RarityWeight, Skin, SyncCursor, SyncStatus,
};
pub use remote::{HttpRemoteAuthority, RemoteAuthority};
pub use services::{ReplicaService, SyncSession};
pub use state::ConnectivityState;
pub use sync::{ConnectivityHint, SyncEvent};
