use std::path::Path;

use crate::commands::common::{open_replica, open_session, CliSettings};
use crate::error::CliError;

pub async fn run_cases(
    refresh: bool,
    as_json: bool,
    db_path: &Path,
    settings: &CliSettings,
) -> Result<(), CliError> {
    if refresh {
        let session = open_session(db_path, settings).await?;
        let count = session.refresh_catalog().await?;
        session.teardown();
        if !as_json {
            println!("Cached {count} case(s) from the remote.");
        }
    }

    let replica = open_replica(db_path).await?;
    let cases = replica.cached_cases().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&cases)?);
        return Ok(());
    }

    if cases.is_empty() {
        println!("No cached cases. Run `skinvault cases --refresh` while online.");
        return Ok(());
    }

    for case in &cases {
        let rarities = case.rarity_table.rarities().collect::<Vec<_>>().join(", ");
        println!("{:<24}  {:<32}  {rarities}", case.id, case.name);
    }
    Ok(())
}
