//! Inventory snapshot model

use serde::{Deserialize, Serialize};

use super::Skin;

/// Whether an inventory entry is known to the remote authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Acknowledged by the remote authority
    #[default]
    Synced,
    /// Drawn locally, waiting in the pending-operation log
    Pending,
}

/// One owned skin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub skin_id: String,
    pub name: String,
    pub rarity: String,
    pub image_ref: String,
    pub cost: f64,
    pub source_case_id: String,
    /// Acquisition timestamp (Unix ms)
    pub acquired_at: i64,
    #[serde(default)]
    pub sync_status: SyncStatus,
}

impl InventoryEntry {
    #[must_use]
    pub fn from_skin(skin: &Skin, acquired_at: i64, sync_status: SyncStatus) -> Self {
        Self {
            skin_id: skin.id.clone(),
            name: skin.name.clone(),
            rarity: skin.rarity.clone(),
            image_ref: skin.image_ref.clone(),
            cost: skin.cost,
            source_case_id: skin.case_id.clone(),
            acquired_at,
            sync_status,
        }
    }

    pub const fn is_pending(&self) -> bool {
        matches!(self.sync_status, SyncStatus::Pending)
    }
}

/// Per-user inventory with derived totals.
///
/// Entries are unique by `skin_id` and kept ordered by `acquired_at`, then
/// `skin_id`. Totals always reflect the entry set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub user_id: String,
    pub entries: Vec<InventoryEntry>,
    pub total_count: usize,
    pub total_value: f64,
}

impl InventorySnapshot {
    /// Create an empty inventory for a user
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            entries: Vec::new(),
            total_count: 0,
            total_value: 0.0,
        }
    }

    /// Build a snapshot from arbitrary entries; later duplicates of a skin win.
    #[must_use]
    pub fn from_entries(user_id: impl Into<String>, entries: Vec<InventoryEntry>) -> Self {
        let mut snapshot = Self::new(user_id);
        for entry in entries {
            snapshot.upsert_unsorted(entry);
        }
        snapshot.normalize();
        snapshot
    }

    pub fn get(&self, skin_id: &str) -> Option<&InventoryEntry> {
        self.entries.iter().find(|entry| entry.skin_id == skin_id)
    }

    pub fn contains(&self, skin_id: &str) -> bool {
        self.get(skin_id).is_some()
    }

    /// Insert or replace the entry for `entry.skin_id`.
    pub fn upsert(&mut self, entry: InventoryEntry) {
        self.upsert_unsorted(entry);
        self.normalize();
    }

    /// Remove the entry for a skin, returning it when present.
    pub fn remove(&mut self, skin_id: &str) -> Option<InventoryEntry> {
        let index = self
            .entries
            .iter()
            .position(|entry| entry.skin_id == skin_id)?;
        let removed = self.entries.remove(index);
        self.recompute_totals();
        Some(removed)
    }

    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_pending()).count()
    }

    /// Restore canonical ordering and recompute totals.
    pub fn normalize(&mut self) {
        self.entries.sort_by(|left, right| {
            left.acquired_at
                .cmp(&right.acquired_at)
                .then_with(|| left.skin_id.cmp(&right.skin_id))
        });
        self.recompute_totals();
    }

    pub fn recompute_totals(&mut self) {
        self.total_count = self.entries.len();
        self.total_value = self.entries.iter().map(|entry| entry.cost).sum();
    }

    fn upsert_unsorted(&mut self, entry: InventoryEntry) {
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|existing| existing.skin_id == entry.skin_id)
        {
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }
}
