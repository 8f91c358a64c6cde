//! Remote authority selection for the CLI.

use skinvault_core::models::{CaseDetail, CaseSummary, PendingOperation};
use skinvault_core::remote::{RemoteDraw, RemoteInventory};
use skinvault_core::{Error, HttpRemoteAuthority, RemoteAuthority, Result};

/// HTTP authority when an API base URL is configured; otherwise every call
/// fails as unreachable and the session stays offline.
#[derive(Debug)]
pub enum CliRemote {
    Http(HttpRemoteAuthority),
    Unconfigured,
}

fn unconfigured() -> Error {
    Error::NetworkUnavailable(
        "no API base URL configured (run `skinvault config init --api-base-url <URL>`)"
            .to_string(),
    )
}

impl CliRemote {
    pub const fn is_configured(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}

impl RemoteAuthority for CliRemote {
    async fn liveness_probe(&self) -> Result<()> {
        match self {
            Self::Http(remote) => remote.liveness_probe().await,
            Self::Unconfigured => Err(unconfigured()),
        }
    }

    async fn submit_draw(&self, case_id: &str, user_id: &str) -> Result<RemoteDraw> {
        match self {
            Self::Http(remote) => remote.submit_draw(case_id, user_id).await,
            Self::Unconfigured => Err(unconfigured()),
        }
    }

    async fn commit_offline_draw(&self, op: &PendingOperation) -> Result<()> {
        match self {
            Self::Http(remote) => remote.commit_offline_draw(op).await,
            Self::Unconfigured => Err(unconfigured()),
        }
    }

    async fn fetch_inventory(&self, user_id: &str, since: Option<i64>) -> Result<RemoteInventory> {
        match self {
            Self::Http(remote) => remote.fetch_inventory(user_id, since).await,
            Self::Unconfigured => Err(unconfigured()),
        }
    }

    async fn fetch_cases(&self) -> Result<Vec<CaseSummary>> {
        match self {
            Self::Http(remote) => remote.fetch_cases().await,
            Self::Unconfigured => Err(unconfigured()),
        }
    }

    async fn fetch_case(&self, case_id: &str) -> Result<CaseDetail> {
        match self {
            Self::Http(remote) => remote.fetch_case(case_id).await,
            Self::Unconfigured => Err(unconfigured()),
        }
    }
}
