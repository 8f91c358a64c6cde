use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] skinvault_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Case ID cannot be empty")]
    EmptyCaseId,
    #[error(
        "No user configured. Pass --user, set SKINVAULT_USER_ID, \
         or run `skinvault config init --user-id <ID>`."
    )]
    MissingUser,
    #[error("Configuration error: {0}")]
    Config(String),
}
