//! Inventory export helpers shared by every interface.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::models::{InventorySnapshot, SyncStatus};
use crate::util::millis_to_rfc3339;

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Serializable inventory line used in JSON exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportItem {
    pub skin_id: String,
    pub name: String,
    pub rarity: String,
    pub cost: f64,
    pub case_id: String,
    pub acquired_at: String,
    pub sync_status: SyncStatus,
}

/// Serializable inventory with totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportInventory {
    pub user_id: String,
    pub total_count: usize,
    pub total_value: f64,
    pub items: Vec<ExportItem>,
}

#[must_use]
pub fn inventory_to_export(snapshot: &InventorySnapshot) -> ExportInventory {
    ExportInventory {
        user_id: snapshot.user_id.clone(),
        total_count: snapshot.total_count,
        total_value: snapshot.total_value,
        items: snapshot
            .entries
            .iter()
            .map(|entry| ExportItem {
                skin_id: entry.skin_id.clone(),
                name: entry.name.clone(),
                rarity: entry.rarity.clone(),
                cost: entry.cost,
                case_id: entry.source_case_id.clone(),
                acquired_at: millis_to_rfc3339(entry.acquired_at),
                sync_status: entry.sync_status,
            })
            .collect(),
    }
}

/// Render an inventory as pretty-printed JSON.
pub fn render_json_export(snapshot: &InventorySnapshot) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&inventory_to_export(snapshot))
}

/// Render an inventory as a Markdown table.
#[must_use]
pub fn render_markdown_export(snapshot: &InventorySnapshot) -> String {
    let export = inventory_to_export(snapshot);
    let mut output = String::new();

    let _ = writeln!(output, "# Inventory of {}", export.user_id);
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "{} skins, total value {:.2}",
        export.total_count, export.total_value
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "| Skin | Rarity | Cost | Acquired | Status |");
    let _ = writeln!(output, "| --- | --- | ---: | --- | --- |");
    for item in &export.items {
        let status = match item.sync_status {
            SyncStatus::Synced => "synced",
            SyncStatus::Pending => "pending",
        };
        let _ = writeln!(
            output,
            "| {} | {} | {:.2} | {} | {status} |",
            item.name.replace('|', "\\|"),
            item.rarity,
            item.cost,
            item.acquired_at
        );
    }

    output
}

/// Render an inventory in the selected format.
pub fn render_inventory_export(
    snapshot: &InventorySnapshot,
    format: ExportFormat,
) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(snapshot),
        ExportFormat::Markdown => Ok(render_markdown_export(snapshot)),
    }
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, timestamp_ms: i64) -> String {
    format!("skinvault-inventory-{timestamp_ms}.{}", format.extension())
}
