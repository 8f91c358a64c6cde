use std::path::Path;

use skinvault_core::sync::ConnectivityHint;
use skinvault_core::SyncEvent;
use tokio::sync::broadcast;

use crate::commands::common::{format_sync_event, open_session, CliSettings};
use crate::error::CliError;

pub async fn run_watch(db_path: &Path, settings: &CliSettings) -> Result<(), CliError> {
    let session = open_session(db_path, settings).await?;
    let mut events = session.subscribe_events();
    println!(
        "Watching connectivity every {}s (Ctrl-C to stop)",
        settings.client_config.probe_interval_secs
    );
    session.hint(ConnectivityHint::Up);

    let stop = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {error}");
        }
        session.teardown();
    };
    let monitor = async {
        tokio::select! {
            result = session.run_monitor() => result,
            () = print_events(&mut events) => Ok(()),
        }
    };

    let (result, ()) = tokio::join!(monitor, stop);
    result?;

    let pending = session.pending_operations().await?.len();
    println!("Stopped. {pending} draw(s) pending.");
    Ok(())
}

async fn print_events(events: &mut broadcast::Receiver<SyncEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => println!("{}", format_sync_event(&event)),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!("Skipped {skipped} sync event(s)");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
