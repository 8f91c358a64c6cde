//! JSON payloads exchanged with the case-opening API

use serde::{Deserialize, Serialize};

use super::{RemoteDraw, RemoteInventory, RemoteInventoryItem};
use crate::models::{Case, CaseDetail, CaseSummary, PendingOperation, RarityTable, Skin};
use crate::util::millis_to_rfc3339;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CaseSummaryPayload {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    #[serde(default)]
    image_url: String,
}

impl From<CaseSummaryPayload> for CaseSummary {
    fn from(value: CaseSummaryPayload) -> Self {
        Self {
            id: value.id,
            name: value.name,
            image_ref: value.image_url,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CaseDetailPayload {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    #[serde(default)]
    image_url: String,
    #[serde(default)]
    rarity_probabilities: RarityTable,
    #[serde(default)]
    skins: Vec<CatalogSkinPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogSkinPayload {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    rarity: String,
    #[serde(default)]
    image_url: String,
    #[serde(default)]
    cost: f64,
}

impl From<CaseDetailPayload> for CaseDetail {
    fn from(value: CaseDetailPayload) -> Self {
        let skins = value
            .skins
            .into_iter()
            .map(|skin| Skin {
                id: skin.id,
                name: skin.name,
                rarity: skin.rarity,
                image_ref: skin.image_url,
                cost: skin.cost,
                case_id: value.id.clone(),
            })
            .collect();

        Self {
            case: Case {
                id: value.id,
                name: value.name,
                image_ref: value.image_url,
                rarity_table: value.rarity_probabilities,
            },
            skins,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OpenCaseResponse {
    random_number: f64,
    rarity_chosen: String,
    skin: OwnedSkinPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnedSkinPayload {
    skin_id: String,
    name: String,
    rarity: String,
    #[serde(default)]
    image_url: String,
    #[serde(default)]
    cost: f64,
    #[serde(default, alias = "case_id")]
    case_id: Option<String>,
    #[serde(default)]
    acquired_at: Option<i64>,
}

impl OpenCaseResponse {
    pub(super) fn into_remote_draw(self, case_id: &str) -> RemoteDraw {
        RemoteDraw {
            skin: Skin {
                id: self.skin.skin_id,
                name: self.skin.name,
                rarity: self.skin.rarity,
                image_ref: self.skin.image_url,
                cost: self.skin.cost,
                case_id: self.skin.case_id.unwrap_or_else(|| case_id.to_string()),
            },
            sample: self.random_number,
            rarity: self.rarity_chosen,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct InventoryResponse {
    #[serde(default)]
    total_skins: Option<usize>,
    #[serde(default)]
    total_value: Option<f64>,
    #[serde(default)]
    skins: Vec<OwnedSkinPayload>,
}

impl From<InventoryResponse> for RemoteInventory {
    fn from(value: InventoryResponse) -> Self {
        let items: Vec<RemoteInventoryItem> = value
            .skins
            .into_iter()
            .map(|skin| RemoteInventoryItem {
                skin_id: skin.skin_id,
                name: skin.name,
                rarity: skin.rarity,
                image_ref: skin.image_url,
                cost: skin.cost,
                case_id: skin.case_id,
                acquired_at: skin.acquired_at,
            })
            .collect();

        Self {
            total_count: value.total_skins.unwrap_or(items.len()),
            total_value: value
                .total_value
                .unwrap_or_else(|| items.iter().map(|item| item.cost).sum()),
            items,
        }
    }
}

/// Body of `POST /cases/{id}/sync`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OfflineDrawRequest<'a> {
    op_id: String,
    user_id: &'a str,
    skin_id: &'a str,
    name: &'a str,
    rarity: &'a str,
    image_url: &'a str,
    cost: f64,
    created_at: String,
    updated_at: String,
}

impl<'a> From<&'a PendingOperation> for OfflineDrawRequest<'a> {
    fn from(op: &'a PendingOperation) -> Self {
        Self {
            op_id: op.op_id.to_string(),
            user_id: &op.user_id,
            skin_id: &op.skin.id,
            name: &op.skin.name,
            rarity: &op.skin.rarity,
            image_url: &op.skin.image_ref,
            cost: op.skin.cost,
            created_at: millis_to_rfc3339(op.created_at),
            updated_at: millis_to_rfc3339(op.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OpenCaseRequest<'a> {
    pub(super) user_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct ApiErrorBody {
    pub(super) error: Option<String>,
    pub(super) message: Option<serde_json::Value>,
}

impl ApiErrorBody {
    /// Error bodies carry `message` as a string or a list of validation messages.
    pub(super) fn message(self) -> Option<String> {
        match self.message {
            Some(serde_json::Value::String(message)) => Some(message),
            Some(serde_json::Value::Array(messages)) => Some(
                messages
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            _ => self.error,
        }
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
    }
}
