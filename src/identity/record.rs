use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Device/install attribution payload and its identifier.
///
/// `id: None` means no identifier was ever stored, which is distinct from
/// `Some("")`. Records are replaced wholesale by a fresh fetch and never
/// merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Full payload as received from the attribution source.
    #[serde(default)]
    pub raw: Map<String, Value>,
}

impl AttributionRecord {
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            raw: Map::new(),
        }
    }

    pub fn from_payload(
        id: impl Into<String>,
        raw: Map<String, Value>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            raw,
        }
    }

    /// True for a record that was never set.
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.raw.is_empty()
    }

    /// True if the record carries a non-empty identifier.
    pub fn has_id(&self) -> bool {
        self.id.as_deref().is_some_and(|id| !id.is_empty())
    }

    /// Identifier, or the empty string when unset.
    pub fn id_str(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }

    /// Mapping form: the raw payload with the identifier under `"id"`.
    pub fn to_mapping(&self) -> Map<String, Value> {
        let mut mapping = self.raw.clone();
        if let Some(id) = &self.id {
            mapping.insert("id".to_string(), Value::String(id.clone()));
        }
        mapping
    }
}

/// Coarse numeric application/user state, e.g. ad eligibility tier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StatusFlag(pub i64);

impl StatusFlag {
    pub fn value(self) -> i64 {
        self.0
    }
}

impl From<i64> for StatusFlag {
    fn from(value: i64) -> Self {
        Self(value)
    }
}
