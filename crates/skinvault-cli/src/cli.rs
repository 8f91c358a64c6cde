use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "skinvault")]
#[command(about = "Open cases and keep your skin inventory in sync, online or not")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile name
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// User whose inventory to operate on
    #[arg(long, global = true, value_name = "ID")]
    pub user: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open a case (falls back to a local draw when offline)
    Open {
        /// Case ID
        case_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the local inventory
    #[command(alias = "inv")]
    Inventory {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List cached cases
    Cases {
        /// Fetch the catalog from the remote before listing
        #[arg(long)]
        refresh: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Push pending draws and pull the remote inventory
    Sync,
    /// Show connectivity and sync status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List draws waiting to be committed remotely
    Pending {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Monitor connectivity and reconcile until interrupted
    Watch,
    /// Export the inventory
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Case-opening API base URL
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Default user ID
        #[arg(long, value_name = "ID")]
        user_id: Option<String>,
        /// Liveness probe interval in seconds
        #[arg(long, value_name = "SECS")]
        probe_interval_secs: Option<u64>,
        /// Remote request timeout in seconds
        #[arg(long, value_name = "SECS")]
        request_timeout_secs: Option<u64>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
}
