use std::path::Path;

use serde::Serialize;
use skinvault_core::{RemoteAuthority, SyncCursor};

use crate::commands::common::{build_remote, format_cursor_lines, open_replica, CliSettings};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub profile: String,
    pub user_id: Option<String>,
    pub api_base_url: Option<String>,
    pub reachable: bool,
    pub pending: usize,
    pub inventory_count: usize,
    pub cursor: SyncCursor,
}

pub async fn run_status(
    as_json: bool,
    db_path: &Path,
    settings: &CliSettings,
) -> Result<(), CliError> {
    let replica = open_replica(db_path).await?;
    let remote = build_remote(settings)?;
    let reachable = match remote.liveness_probe().await {
        Ok(()) => true,
        Err(error) => {
            tracing::debug!("Liveness probe failed: {error}");
            false
        }
    };

    let (pending, inventory_count) = match settings.user_id.as_deref() {
        Some(user_id) => (
            replica.pending_count(user_id).await?,
            replica.inventory(user_id).await?.total_count,
        ),
        None => (0, 0),
    };

    let report = StatusReport {
        profile: settings.profile_name.clone(),
        user_id: settings.user_id.clone(),
        api_base_url: settings.client_config.api_base_url.clone(),
        reachable,
        pending,
        inventory_count,
        cursor: replica.load_cursor().await?,
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for line in format_status_lines(&report) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_status_lines(report: &StatusReport) -> Vec<String> {
    let mut lines = vec![
        format!("Profile: {}", report.profile),
        format!("User: {}", report.user_id.as_deref().unwrap_or("(not set)")),
        format!(
            "Remote: {} ({})",
            report.api_base_url.as_deref().unwrap_or("(not configured)"),
            if report.reachable { "reachable" } else { "unreachable" }
        ),
        format!("Inventory: {} item(s)", report.inventory_count),
        format!("Pending draws: {}", report.pending),
    ];
    lines.extend(format_cursor_lines(&report.cursor));
    lines
}
