use std::path::Path;

use skinvault_core::ConnectivityState;

use crate::commands::common::{format_reconcile_summary, open_session, CliSettings};
use crate::error::CliError;

pub async fn run_sync(db_path: &Path, settings: &CliSettings) -> Result<(), CliError> {
    let session = open_session(db_path, settings).await?;
    if !session.controller().remote().is_configured() {
        return Err(CliError::Config(
            "No API base URL configured. Run `skinvault config init --api-base-url <URL>`."
                .to_string(),
        ));
    }

    let summary = session.controller().probe().await?;
    let state = session.connectivity_state();
    session.teardown();

    match summary {
        Some(summary) => {
            println!("Sync completed: {}", format_reconcile_summary(&summary));
            if state == ConnectivityState::Offline {
                println!("Remote became unreachable; remaining draws stay queued.");
            }
        }
        None => {
            let pending = session.pending_operations().await?.len();
            println!("Remote unreachable; {pending} draw(s) remain queued.");
        }
    }
    Ok(())
}
