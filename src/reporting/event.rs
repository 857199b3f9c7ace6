use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Primitive value attached to an analytics event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Event parameters. Keys are unique by construction.
pub type EventParams = BTreeMap<String, ParamValue>;

/// A named occurrence reported to the external analytics collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: EventParams,
}

impl AnalyticsEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: EventParams::new(),
        }
    }

    pub fn with_params(name: impl Into<String>, params: EventParams) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// Builder-style parameter insertion. Replaces an existing key.
    pub fn param(
        mut self,
        key: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_flat_params() {
        let event = AnalyticsEvent::new("level_complete")
            .param("level", 3)
            .param("perfect", true)
            .param("score", 0.5)
            .param("mode", "bluff");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "level_complete",
                "params": {
                    "level": 3,
                    "mode": "bluff",
                    "perfect": true,
                    "score": 0.5,
                }
            })
        );

        let bare = serde_json::to_value(AnalyticsEvent::new("open")).unwrap();
        assert_eq!(bare, serde_json::json!({ "name": "open" }));
    }
}
