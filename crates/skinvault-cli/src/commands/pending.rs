use std::path::Path;

use crate::commands::common::{
    format_pending_lines, open_replica, pending_to_list_item, CliSettings, PendingListItem,
};
use crate::error::CliError;

pub async fn run_pending(
    as_json: bool,
    db_path: &Path,
    settings: &CliSettings,
) -> Result<(), CliError> {
    let user_id = settings.require_user()?;
    let replica = open_replica(db_path).await?;
    let ops = replica.pending_operations(user_id).await?;

    if as_json {
        let items = ops
            .iter()
            .map(pending_to_list_item)
            .collect::<Vec<PendingListItem>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if ops.is_empty() {
        println!("No pending draws.");
        return Ok(());
    }

    for line in format_pending_lines(&ops) {
        println!("{line}");
    }
    Ok(())
}
