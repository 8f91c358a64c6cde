//! Merging pulled remote inventory into the local snapshot

use std::collections::HashSet;

use crate::models::{InventoryEntry, InventorySnapshot, SyncStatus};
use crate::remote::RemoteInventoryItem;

/// What a merge did to the local snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Remote skins that were missing locally
    pub added: usize,
    /// Remote skins whose local entry differed
    pub updated: usize,
    /// Remote skins already identical locally
    pub unchanged: usize,
    /// Local skins absent from the pulled set, kept as they were
    pub retained: usize,
}

impl MergeReport {
    pub const fn changed(&self) -> bool {
        self.added > 0 || self.updated > 0
    }
}

/// Merge remote items into `local`.
///
/// Remote items overwrite the local entry of the same skin and are marked
/// synced. Local entries the pull did not mention are never dropped, so a
/// partial or incremental pull cannot lose unacknowledged writes. Fields the
/// remote omits (acquisition time, source case) are inherited from the local
/// entry, or fall back to `pulled_at` and an empty case id.
pub fn merge_inventory(
    local: &InventorySnapshot,
    remote: &[RemoteInventoryItem],
    pulled_at: i64,
) -> (InventorySnapshot, MergeReport) {
    let mut merged = local.clone();
    let mut report = MergeReport::default();
    let mut seen = HashSet::new();

    for item in remote {
        seen.insert(item.skin_id.as_str());
        let existing = merged.get(&item.skin_id);
        let entry = entry_from_remote(item, existing, pulled_at);

        match existing {
            None => report.added += 1,
            Some(current) if *current == entry => report.unchanged += 1,
            Some(_) => report.updated += 1,
        }
        merged.upsert(entry);
    }

    report.retained = local
        .entries
        .iter()
        .filter(|entry| !seen.contains(entry.skin_id.as_str()))
        .count();
    merged.normalize();
    (merged, report)
}

fn entry_from_remote(
    item: &RemoteInventoryItem,
    existing: Option<&InventoryEntry>,
    pulled_at: i64,
) -> InventoryEntry {
    InventoryEntry {
        skin_id: item.skin_id.clone(),
        name: item.name.clone(),
        rarity: item.rarity.clone(),
        image_ref: item.image_ref.clone(),
        cost: item.cost,
        source_case_id: item
            .case_id
            .clone()
            .or_else(|| existing.map(|entry| entry.source_case_id.clone()))
            .unwrap_or_default(),
        acquired_at: item
            .acquired_at
            .or_else(|| existing.map(|entry| entry.acquired_at))
            .unwrap_or(pulled_at),
        sync_status: SyncStatus::Synced,
    }
}

/// Mark each entry pending iff a queued operation still refers to its skin.
///
/// Returns whether any status changed.
pub fn apply_pending_status<'a>(
    snapshot: &mut InventorySnapshot,
    pending_skin_ids: impl IntoIterator<Item = &'a str>,
) -> bool {
    let pending: HashSet<&str> = pending_skin_ids.into_iter().collect();
    let mut changed = false;
    for entry in &mut snapshot.entries {
        let status = if pending.contains(entry.skin_id.as_str()) {
            SyncStatus::Pending
        } else {
            SyncStatus::Synced
        };
        if entry.sync_status != status {
            entry.sync_status = status;
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn item(skin_id: &str, cost: f64, acquired_at: Option<i64>) -> RemoteInventoryItem {
        RemoteInventoryItem {
            skin_id: skin_id.to_string(),
            name: format!("Skin {skin_id}"),
            rarity: "Classified".to_string(),
            image_ref: String::new(),
            cost,
            case_id: Some("case-1".to_string()),
            acquired_at,
        }
    }

    fn entry(skin_id: &str, cost: f64, acquired_at: i64, status: SyncStatus) -> InventoryEntry {
        InventoryEntry {
            skin_id: skin_id.to_string(),
            name: format!("Skin {skin_id}"),
            rarity: "Classified".to_string(),
            image_ref: String::new(),
            cost,
            source_case_id: "case-1".to_string(),
            acquired_at,
            sync_status: status,
        }
    }

    #[test]
    fn partial_pull_retains_local_entries() {
        let local = InventorySnapshot::from_entries(
            "u1",
            vec![
                entry("a", 1.0, 10, SyncStatus::Synced),
                entry("b", 2.0, 20, SyncStatus::Synced),
                entry("c", 3.0, 30, SyncStatus::Pending),
            ],
        );

        let (merged, report) = merge_inventory(&local, &[item("a", 1.0, Some(10))], 99);

        assert_eq!(merged.total_count, 3);
        assert!((merged.total_value - 6.0).abs() < f64::EPSILON);
        assert!(merged.get("c").unwrap().is_pending());
        assert_eq!(
            report,
            MergeReport {
                added: 0,
                updated: 0,
                unchanged: 1,
                retained: 2,
            }
        );
    }

    #[test]
    fn remote_values_win_and_missing_fields_are_inherited() {
        let local =
            InventorySnapshot::from_entries("u1", vec![entry("a", 1.0, 10, SyncStatus::Pending)]);
        let mut remote = item("a", 4.0, None);
        remote.case_id = None;

        let (merged, report) = merge_inventory(&local, &[remote, item("z", 2.0, None)], 500);

        let updated = merged.get("a").unwrap();
        assert!((updated.cost - 4.0).abs() < f64::EPSILON);
        assert_eq!(updated.acquired_at, 10);
        assert_eq!(updated.source_case_id, "case-1");
        assert_eq!(updated.sync_status, SyncStatus::Synced);
        assert_eq!(merged.get("z").unwrap().acquired_at, 500);
        assert_eq!(report.added, 1);
        assert_eq!(report.updated, 1);
        assert!(report.changed());
    }

    #[test]
    fn disjoint_pulls_commute() {
        let local =
            InventorySnapshot::from_entries("u1", vec![entry("a", 1.0, 5, SyncStatus::Synced)]);
        let first = [item("b", 2.0, Some(20)), item("c", 3.0, Some(15))];
        let second = [item("d", 4.0, Some(1))];

        let (left, _) = merge_inventory(&local, &first, 100);
        let (left, _) = merge_inventory(&left, &second, 100);
        let (right, _) = merge_inventory(&local, &second, 100);
        let (right, _) = merge_inventory(&right, &first, 100);

        assert_eq!(left, right);
        let ids = left
            .entries
            .iter()
            .map(|entry| entry.skin_id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["d", "a", "c", "b"]);
    }

    #[test]
    fn merge_never_decreases_count() {
        let local = InventorySnapshot::from_entries(
            "u1",
            vec![
                entry("a", 1.0, 1, SyncStatus::Synced),
                entry("b", 1.0, 2, SyncStatus::Pending),
            ],
        );
        for pulled in [vec![], vec![item("a", 1.0, Some(1))], vec![item("x", 1.0, None)]] {
            let (merged, _) = merge_inventory(&local, &pulled, 0);
            assert!(merged.total_count >= local.total_count);
        }
    }

    #[test]
    fn pending_status_follows_queued_operations() {
        let mut snapshot = InventorySnapshot::from_entries(
            "u1",
            vec![
                entry("a", 1.0, 1, SyncStatus::Pending),
                entry("b", 1.0, 2, SyncStatus::Synced),
            ],
        );

        assert!(apply_pending_status(&mut snapshot, ["b"]));
        assert_eq!(snapshot.get("a").unwrap().sync_status, SyncStatus::Synced);
        assert_eq!(snapshot.get("b").unwrap().sync_status, SyncStatus::Pending);
        assert!(!apply_pending_status(&mut snapshot, ["b"]));
    }
}
