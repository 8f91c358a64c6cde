//! Catalog models: cases, their rarity tables, and skins

use serde::{Deserialize, Deserializer, Serialize};

/// One row of a rarity table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RarityWeight {
    /// Rarity tier label (e.g. "Mil-Spec")
    pub rarity: String,
    /// Relative weight; any non-negative unit
    #[serde(alias = "probability", deserialize_with = "deserialize_weight")]
    pub weight: f64,
}

impl RarityWeight {
    #[must_use]
    pub fn new(rarity: impl Into<String>, weight: f64) -> Self {
        Self {
            rarity: rarity.into(),
            weight,
        }
    }
}

/// Ordered rarity weights of a case. Order defines the draw partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RarityTable(Vec<RarityWeight>);

impl RarityTable {
    /// Build a table from `(rarity, weight)` pairs.
    #[must_use]
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, f64)>) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(rarity, weight)| RarityWeight::new(rarity, weight))
                .collect(),
        )
    }

    pub fn entries(&self) -> &[RarityWeight] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Rarity labels in table order.
    pub fn rarities(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|entry| entry.rarity.as_str())
    }
}

/// Case as listed by the remote (no rarity table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseSummary {
    pub id: String,
    pub name: String,
    pub image_ref: String,
}

/// A case: named pool of skins with its rarity table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    pub name: String,
    pub image_ref: String,
    pub rarity_table: RarityTable,
}

impl Case {
    #[must_use]
    pub fn summary(&self) -> CaseSummary {
        CaseSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            image_ref: self.image_ref.clone(),
        }
    }
}

/// Catalog entry. Immutable once created; identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skin {
    pub id: String,
    pub name: String,
    pub rarity: String,
    pub image_ref: String,
    #[serde(default)]
    pub cost: f64,
    pub case_id: String,
}

/// A case together with every skin it can yield.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseDetail {
    pub case: Case,
    pub skins: Vec<Skin>,
}

impl CaseDetail {
    /// Skins of the given rarity, in catalog order.
    pub fn skins_of_rarity<'a>(&'a self, rarity: &'a str) -> impl Iterator<Item = &'a Skin> {
        self.skins.iter().filter(move |skin| skin.rarity == rarity)
    }
}

/// Weights are published either as numbers or as numeric strings.
fn deserialize_weight<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawWeight {
        Number(f64),
        Text(String),
    }

    match RawWeight::deserialize(deserializer)? {
        RawWeight::Number(value) => Ok(value),
        RawWeight::Text(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("invalid weight '{text}'"))),
    }
}
