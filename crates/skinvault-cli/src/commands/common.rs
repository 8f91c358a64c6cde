use std::env;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use skinvault_core::models::DrawOrigin;
use skinvault_core::sync::ReconcileSummary;
use skinvault_core::util::normalize_text_option;
use skinvault_core::{
    ClientConfig, DrawOutcome, HttpRemoteAuthority, InventorySnapshot, PendingOperation,
    ReplicaService, SyncCursor, SyncEvent, SyncSession, SyncStatus,
};

use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;
use crate::remote::CliRemote;

pub const ENV_DB_PATH: &str = "SKINVAULT_DB_PATH";
pub const ENV_USER_ID: &str = "SKINVAULT_USER_ID";
pub const ENV_ACCESS_TOKEN: &str = "SKINVAULT_ACCESS_TOKEN";

/// Effective settings for one CLI invocation.
#[derive(Debug, Clone)]
pub struct CliSettings {
    pub profile_name: String,
    pub user_id: Option<String>,
    pub client_config: ClientConfig,
    pub access_token: Option<String>,
}

impl CliSettings {
    pub fn require_user(&self) -> Result<&str, CliError> {
        self.user_id.as_deref().ok_or(CliError::MissingUser)
    }
}

#[derive(Debug, Serialize)]
pub struct InventoryListItem {
    pub skin_id: String,
    pub name: String,
    pub rarity: String,
    pub cost: f64,
    pub case_id: String,
    pub acquired_at: i64,
    pub relative_time: String,
    pub sync_status: SyncStatus,
}

#[derive(Debug, Serialize)]
pub struct PendingListItem {
    pub op_id: String,
    pub case_id: String,
    pub skin_id: String,
    pub skin_name: String,
    pub created_at: i64,
    pub created_at_iso: String,
    pub attempts: u32,
    pub last_error: Option<String>,
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os(ENV_DB_PATH).map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("skinvault")
        .join("skinvault.db")
}

/// Pick the user: `--user`, then the environment, then the profile.
pub fn resolve_user_id(
    explicit: Option<&str>,
    from_env: Option<String>,
    from_profile: Option<String>,
) -> Option<String> {
    normalize_text_option(explicit.map(str::to_string))
        .or_else(|| normalize_text_option(from_env))
        .or_else(|| normalize_text_option(from_profile))
}

pub fn resolve_settings(
    cli_user: Option<&str>,
    cli_profile: Option<&str>,
) -> Result<CliSettings, CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(cli_profile);
    let profile = config.profile(&profile_name).cloned().unwrap_or_default();

    let client_config = profile.client_config().with_env_overrides()?;
    let user_id = resolve_user_id(cli_user, env::var(ENV_USER_ID).ok(), profile.user_id);
    let access_token = normalize_text_option(env::var(ENV_ACCESS_TOKEN).ok());

    Ok(CliSettings {
        profile_name,
        user_id,
        client_config,
        access_token,
    })
}

pub fn build_remote(settings: &CliSettings) -> Result<CliRemote, CliError> {
    if settings.client_config.api_base_url.is_none() {
        tracing::debug!(
            "Profile '{}' has no API base URL; running offline",
            settings.profile_name
        );
        return Ok(CliRemote::Unconfigured);
    }
    Ok(CliRemote::Http(HttpRemoteAuthority::new(
        &settings.client_config,
        settings.access_token.clone(),
    )?))
}

pub async fn open_replica(path: &Path) -> Result<ReplicaService, CliError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(ReplicaService::open_path(path.to_path_buf()).await?)
}

pub async fn open_session(
    db_path: &Path,
    settings: &CliSettings,
) -> Result<SyncSession<CliRemote>, CliError> {
    let user_id = settings.require_user()?.to_string();
    let replica = open_replica(db_path).await?;
    let remote = build_remote(settings)?;
    Ok(SyncSession::start(
        replica,
        remote,
        user_id,
        &settings.client_config,
    )?)
}

pub fn normalize_case_id(case_id: &str) -> Result<String, CliError> {
    let trimmed = case_id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyCaseId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn inventory_to_list_items(snapshot: &InventorySnapshot) -> Vec<InventoryListItem> {
    let now_ms = Utc::now().timestamp_millis();
    snapshot
        .entries
        .iter()
        .map(|entry| InventoryListItem {
            skin_id: entry.skin_id.clone(),
            name: entry.name.clone(),
            rarity: entry.rarity.clone(),
            cost: entry.cost,
            case_id: entry.source_case_id.clone(),
            acquired_at: entry.acquired_at,
            relative_time: format_relative_time(entry.acquired_at, now_ms),
            sync_status: entry.sync_status,
        })
        .collect()
}

pub fn format_inventory_lines(snapshot: &InventorySnapshot, now_ms: i64) -> Vec<String> {
    snapshot
        .entries
        .iter()
        .map(|entry| {
            let marker = if entry.is_pending() { "*" } else { " " };
            let name = truncate(&entry.name, 32);
            let relative_time = format_relative_time(entry.acquired_at, now_ms);
            format!(
                "{marker} {name:<32}  {:<12}  {:>9}  {relative_time}",
                truncate(&entry.rarity, 12),
                format_cost(entry.cost),
            )
        })
        .collect()
}

pub fn format_inventory_footer(snapshot: &InventorySnapshot) -> String {
    let pending = snapshot.pending_count();
    let mut footer = format!(
        "{} item(s), total value {}",
        snapshot.total_count,
        format_cost(snapshot.total_value)
    );
    if pending > 0 {
        footer.push_str(&format!(", {pending} pending (*)"));
    }
    footer
}

pub fn pending_to_list_item(op: &PendingOperation) -> PendingListItem {
    PendingListItem {
        op_id: op.op_id.to_string(),
        case_id: op.case_id.clone(),
        skin_id: op.skin.id.clone(),
        skin_name: op.skin.name.clone(),
        created_at: op.created_at,
        created_at_iso: format_sync_timestamp(op.created_at),
        attempts: op.attempts,
        last_error: op.last_error.clone(),
    }
}

pub fn format_pending_lines(ops: &[PendingOperation]) -> Vec<String> {
    ops.iter()
        .map(|op| {
            let op_id = op.op_id.to_string();
            let short_id = op_id.chars().take(8).collect::<String>();
            let mut line = format!(
                "{short_id}  {}  case={}  skin={}  attempts={}",
                format_sync_timestamp(op.created_at),
                op.case_id,
                op.skin.name,
                op.attempts
            );
            if let Some(error) = op.last_error.as_deref() {
                line.push_str(&format!("  last_error={error}"));
            }
            line
        })
        .collect()
}

pub fn format_outcome(outcome: &DrawOutcome) -> String {
    let origin = match outcome.origin {
        DrawOrigin::Remote => "committed remotely",
        DrawOrigin::LocalFallback => "drawn offline, queued for sync",
    };
    format!(
        "You got {} [{}] worth {} ({origin})",
        outcome.skin.name,
        outcome.chosen_rarity,
        format_cost(outcome.skin.cost)
    )
}

pub fn format_reconcile_summary(summary: &ReconcileSummary) -> String {
    let mut parts = vec![format!("pushed {}", summary.pushed)];
    if summary.rejected > 0 {
        parts.push(format!("rejected {}", summary.rejected));
    }
    if summary.remaining > 0 {
        parts.push(format!("{} still pending", summary.remaining));
    }
    match summary.pull {
        Some(report) => parts.push(format!(
            "pulled +{} added, {} updated",
            report.added, report.updated
        )),
        None => parts.push("pull skipped".to_string()),
    }
    parts.join(", ")
}

pub fn format_cursor_lines(cursor: &SyncCursor) -> Vec<String> {
    let render =
        |value: Option<i64>| value.map_or_else(|| "never".to_string(), format_sync_timestamp);
    vec![
        format!("Last push: {}", render(cursor.last_push_at)),
        format!("Last pull: {}", render(cursor.last_pull_at)),
    ]
}

pub fn format_sync_event(event: &SyncEvent) -> String {
    match event {
        SyncEvent::StateChanged { from, to } => format!("connectivity {from} -> {to}"),
        SyncEvent::OperationCommitted { op_id, skin_id } => {
            format!("committed {skin_id} (op {op_id})")
        }
        SyncEvent::OperationRejected {
            op_id,
            skin_id,
            reason,
        } => format!("rejected {skin_id} (op {op_id}): {reason}"),
        SyncEvent::PushAborted { remaining, reason } => {
            format!("push stopped with {remaining} pending: {reason}")
        }
        SyncEvent::PullCompleted { report } => format!(
            "pulled inventory: {} added, {} updated, {} unchanged",
            report.added, report.updated, report.unchanged
        ),
        SyncEvent::PullFailed { reason } => format!("pull failed: {reason}"),
        SyncEvent::CatalogRefreshed { cases } => format!("catalog refreshed: {cases} case(s)"),
    }
}

pub fn format_cost(cost: f64) -> String {
    format!("${cost:.2}")
}

pub fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = value.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}
