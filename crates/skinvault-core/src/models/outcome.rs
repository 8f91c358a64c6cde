//! Draw outcome model

use serde::{Deserialize, Serialize};

use super::{OpId, Skin};

/// Where a draw was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawOrigin {
    /// Drawn and committed by the remote authority
    Remote,
    /// Drawn locally and queued in the pending-operation log
    LocalFallback,
}

/// Result of opening a case. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawOutcome {
    pub case_id: String,
    pub user_id: String,
    /// Rarity sample in `[0, 1]`
    pub sample: f64,
    /// Skin-selection sample; remote draws do not report one
    #[serde(default)]
    pub skin_sample: Option<f64>,
    pub chosen_rarity: String,
    pub chosen_skin_id: String,
    pub skin: Skin,
    /// Draw timestamp (Unix ms)
    pub timestamp: i64,
    pub origin: DrawOrigin,
    /// Pending operation created for a local draw
    #[serde(default)]
    pub op_id: Option<OpId>,
}

impl DrawOutcome {
    pub const fn is_local(&self) -> bool {
        matches!(self.origin, DrawOrigin::LocalFallback)
    }
}
