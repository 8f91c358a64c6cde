//! Database layer for skinvault

mod connection;
mod cursor_repository;
mod migrations;
mod pending_repository;
mod replica_repository;

pub use connection::Database;
pub use cursor_repository::{LibSqlSyncCursorRepository, SyncCursorRepository};
pub use pending_repository::{LibSqlPendingLog, PendingLog};
pub use replica_repository::{CatalogEntity, EntityKind, LibSqlReplicaStore, ReplicaStore};
