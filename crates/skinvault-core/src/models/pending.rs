//! Pending operation model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{InventoryEntry, Skin};

/// Namespace for deterministic operation ids.
const OP_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6b1d_9c3e_52f4_4a0b_9e1f_0d7c_3a58_e214);

/// Identifier of a pending operation.
///
/// Derived from `(user_id, skin_id, created_at)` with UUID v5, so the same
/// draw always maps to the same id and re-appending it is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpId(Uuid);

impl OpId {
    #[must_use]
    pub fn derive(user_id: &str, skin_id: &str, created_at: i64) -> Self {
        let name = format!("{user_id}\u{1f}{skin_id}\u{1f}{created_at}");
        Self(Uuid::new_v5(&OP_ID_NAMESPACE, name.as_bytes()))
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OpId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// An inventory mutation recorded while the remote authority was unreachable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOperation {
    pub op_id: OpId,
    pub user_id: String,
    pub case_id: String,
    /// Skin as it was in the catalog at draw time
    pub skin: Skin,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
    /// Failed submission attempts so far
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub last_error: Option<String>,
    /// Entry the draw replaced, restored if the remote rejects it
    #[serde(default)]
    pub previous_entry: Option<InventoryEntry>,
}

impl PendingOperation {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        case_id: impl Into<String>,
        skin: Skin,
        created_at: i64,
    ) -> Self {
        let user_id = user_id.into();
        Self {
            op_id: OpId::derive(&user_id, &skin.id, created_at),
            user_id,
            case_id: case_id.into(),
            skin,
            created_at,
            updated_at: created_at,
            attempts: 0,
            last_error: None,
            previous_entry: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skin(id: &str) -> Skin {
        Skin {
            id: id.to_string(),
            name: "AK-47 | Redline".to_string(),
            rarity: "Classified".to_string(),
            image_ref: String::new(),
            cost: 12.5,
            case_id: "case-1".to_string(),
        }
    }

    #[test]
    fn op_id_is_deterministic() {
        assert_eq!(OpId::derive("u1", "s1", 10), OpId::derive("u1", "s1", 10));
        assert_ne!(OpId::derive("u1", "s1", 10), OpId::derive("u1", "s1", 11));
        assert_ne!(OpId::derive("u1", "s1", 10), OpId::derive("u2", "s1", 10));
    }

    #[test]
    fn op_id_parse_roundtrip() {
        let id = OpId::derive("u1", "s1", 10);
        let parsed: OpId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn new_operation_uses_derived_id() {
        let op = PendingOperation::new("u1", "case-1", skin("s1"), 42);
        assert_eq!(op.op_id, OpId::derive("u1", "s1", 42));
        assert_eq!(op.created_at, op.updated_at);
        assert_eq!(op.attempts, 0);
    }
}
