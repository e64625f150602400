//! The default user profile schema.
//!
//! Custom properties are added, replaced, and removed by posting a partial
//! schema: a property mapped to `null` is removed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubschemaKind {
    Base,
    Custom,
}

impl SubschemaKind {
    pub const ALL: [&'static str; 2] = ["base", "custom"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for SubschemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubschemaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base" => Ok(Self::Base),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown subschema '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub definitions: SchemaDefinitions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinitions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<SubSchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<SubSchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubSchema {
    pub id: String,
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(default)]
    pub properties: BTreeMap<String, Option<UserSchemaProperty>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl SubSchema {
    pub fn new(kind: SubschemaKind) -> Self {
        Self {
            id: format!("#{}", kind.as_str()),
            schema_type: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }
}

impl UserSchema {
    /// The subschema of the given kind, if the schema carries one.
    pub fn subschema(&self, kind: SubschemaKind) -> Option<&SubSchema> {
        match kind {
            SubschemaKind::Base => self.definitions.base.as_ref(),
            SubschemaKind::Custom => self.definitions.custom.as_ref(),
        }
    }

    /// Names of the properties defined in a subschema.
    pub fn property_names(&self, kind: SubschemaKind) -> Vec<&str> {
        self.subschema(kind)
            .map(|sub| {
                sub.properties
                    .iter()
                    .filter(|(_, prop)| prop.is_some())
                    .map(|(name, _)| name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// A partial schema touching a single custom property.
    pub fn custom_property(index: &str, property: Option<UserSchemaProperty>) -> Self {
        let mut custom = SubSchema::new(SubschemaKind::Custom);
        custom.properties.insert(index.to_string(), property);
        Self {
            id: None,
            definitions: SchemaDefinitions {
                base: None,
                custom: Some(custom),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSchemaProperty {
    pub title: String,
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<ArrayItems>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
    /// Allowed values, typed like the property (or its array elements)
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<Permission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master: Option<Master>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayItems {
    #[serde(rename = "type")]
    pub item_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub principal: String,
    pub action: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Master {
    #[serde(rename = "type")]
    pub master_type: String,
}
