//! Profile mappings between a source and a target identity object.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PushStatus {
    Push,
    #[default]
    DontPush,
}

impl PushStatus {
    pub const ALL: [&'static str; 2] = ["PUSH", "DONT_PUSH"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "PUSH",
            Self::DontPush => "DONT_PUSH",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PUSH" => Some(Self::Push),
            "DONT_PUSH" => Some(Self::DontPush),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<MappingSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<MappingSource>,
    /// Property key to mapping; `None` removes the key remotely.
    #[serde(default)]
    pub properties: BTreeMap<String, Option<MappingProperty>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingSource {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingProperty {
    pub expression: String,
    pub push_status: PushStatus,
}
