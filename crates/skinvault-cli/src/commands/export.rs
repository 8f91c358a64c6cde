use std::path::{Path, PathBuf};

use skinvault_core::export::{
    render_inventory_export, suggested_export_file_name, ExportFormat as CoreExportFormat,
};
use skinvault_core::util::now_millis;

use crate::cli::ExportFormat;
use crate::commands::common::{open_replica, CliSettings};
use crate::error::CliError;

pub const fn core_export_format(format: ExportFormat) -> CoreExportFormat {
    match format {
        ExportFormat::Json => CoreExportFormat::Json,
        ExportFormat::Markdown => CoreExportFormat::Markdown,
    }
}

pub async fn run_export(
    format: ExportFormat,
    output_path: Option<&Path>,
    db_path: &Path,
    settings: &CliSettings,
) -> Result<(), CliError> {
    let user_id = settings.require_user()?;
    let replica = open_replica(db_path).await?;
    let snapshot = replica.inventory(user_id).await?;
    let format = core_export_format(format);
    let rendered = render_inventory_export(&snapshot, format)?;

    if let Some(path) = output_path.map(|path| resolve_output_path(path, format)) {
        std::fs::write(&path, rendered)?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}

/// A directory target gets a timestamped file name inside it.
pub fn resolve_output_path(path: &Path, format: CoreExportFormat) -> PathBuf {
    if path.is_dir() {
        path.join(suggested_export_file_name(format, now_millis()))
    } else {
        path.to_path_buf()
    }
}
