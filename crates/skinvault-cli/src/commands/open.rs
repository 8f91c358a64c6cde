use std::path::Path;

use crate::commands::common::{
    format_outcome, format_reconcile_summary, normalize_case_id, open_session, CliSettings,
};
use crate::error::CliError;

pub async fn run_open(
    case_id: &str,
    as_json: bool,
    db_path: &Path,
    settings: &CliSettings,
) -> Result<(), CliError> {
    let case_id = normalize_case_id(case_id)?;
    let session = open_session(db_path, settings).await?;

    // A reachable remote drains the pending log before the draw.
    if let Some(summary) = session.controller().probe().await? {
        tracing::info!("Reconciled before draw: {}", format_reconcile_summary(&summary));
    }

    let outcome = session.open_case(&case_id).await?;
    session.teardown();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", format_outcome(&outcome));
    }
    Ok(())
}
