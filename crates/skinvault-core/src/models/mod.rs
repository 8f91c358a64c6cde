//! Data models for skinvault

mod catalog;
mod cursor;
mod inventory;
mod outcome;
mod pending;

pub use catalog::{Case, CaseDetail, CaseSummary, RarityTable, RarityWeight, Skin};
pub use cursor::SyncCursor;
pub use inventory::{InventoryEntry, InventorySnapshot, SyncStatus};
pub use outcome::{DrawOrigin, DrawOutcome};
pub use pending::{OpId, PendingOperation};
