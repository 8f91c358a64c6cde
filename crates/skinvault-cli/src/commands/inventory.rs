use std::path::Path;

use chrono::Utc;

use crate::commands::common::{
    format_inventory_footer, format_inventory_lines, inventory_to_list_items, open_replica,
    CliSettings,
};
use crate::error::CliError;

pub async fn run_inventory(
    as_json: bool,
    db_path: &Path,
    settings: &CliSettings,
) -> Result<(), CliError> {
    let user_id = settings.require_user()?;
    let replica = open_replica(db_path).await?;
    let snapshot = replica.inventory(user_id).await?;

    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&inventory_to_list_items(&snapshot))?
        );
        return Ok(());
    }

    if snapshot.entries.is_empty() {
        println!("Inventory is empty.");
        return Ok(());
    }

    for line in format_inventory_lines(&snapshot, Utc::now().timestamp_millis()) {
        println!("{line}");
    }
    println!("{}", format_inventory_footer(&snapshot));
    Ok(())
}
