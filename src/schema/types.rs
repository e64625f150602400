//! Attribute schema definitions for resources and data sources.
//!
//! A [`ResourceSchema`] names every attribute a resource accepts in its
//! configuration, together with its type, whether it is required, its default
//! and the values it may take. Nested option groups are expressed as blocks:
//! lists of objects with their own sub-attributes, usually limited to a single
//! element.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schema of one resource or data source type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSchema {
    /// Type name, e.g. `okta_policies`
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Top-level attributes
    pub attributes: Vec<AttributeSchema>,
}

impl ResourceSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            attributes: Vec::new(),
        }
    }

    /// Add an attribute (builder style).
    pub fn attribute(mut self, attribute: AttributeSchema) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Names of attributes the user may set.
    pub fn configurable_attributes(&self) -> impl Iterator<Item = &AttributeSchema> {
        self.attributes.iter().filter(|a| !a.is_computed_only())
    }
}

/// Value types an attribute can hold.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    #[default]
    String,
    Int,
    Bool,
    /// List of strings
    List,
    /// List of nested objects described by sub-attributes
    Block,
}

impl AttributeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::List => "list",
            Self::Block => "block",
        }
    }
}

/// Definition of one attribute.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeSchema {
    pub name: String,
    pub data_type: AttributeType,
    /// Must be present in configuration
    pub required: bool,
    /// May be present in configuration
    pub optional: bool,
    /// Filled in by the resource rather than the user
    pub computed: bool,
    /// Value substituted when the attribute is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Allowed values for string attributes (and list elements)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub canonical_values: Vec<String>,
    /// Inclusive bounds for int attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub int_range: Option<(i64, i64)>,
    /// Changing the value replaces the remote object
    pub force_new: bool,
    /// Upper bound on the number of blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    /// Sub-attributes of a block
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_attributes: Vec<AttributeSchema>,
    #[serde(default)]
    pub description: String,
}

impl AttributeSchema {
    fn of(name: &str, data_type: AttributeType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            optional: true,
            ..Default::default()
        }
    }

    pub fn string(name: &str) -> Self {
        Self::of(name, AttributeType::String)
    }

    pub fn int(name: &str) -> Self {
        Self::of(name, AttributeType::Int)
    }

    pub fn bool(name: &str) -> Self {
        Self::of(name, AttributeType::Bool)
    }

    pub fn list(name: &str) -> Self {
        Self::of(name, AttributeType::List)
    }

    /// A single-element block. See [`block_list`](Self::block_list) for repeated blocks.
    pub fn block(name: &str, sub_attributes: Vec<AttributeSchema>) -> Self {
        Self {
            max_items: Some(1),
            sub_attributes,
            ..Self::of(name, AttributeType::Block)
        }
    }

    /// A block that may repeat any number of times.
    pub fn block_list(name: &str, sub_attributes: Vec<AttributeSchema>) -> Self {
        Self {
            sub_attributes,
            ..Self::of(name, AttributeType::Block)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self
    }

    /// Set by the resource only.
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self.optional = false;
        self
    }

    /// Optional in configuration but filled in by the resource when absent.
    pub fn optional_computed(mut self) -> Self {
        self.computed = true;
        self.optional = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.canonical_values = values.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn range(mut self, min: i64, max: i64) -> Self {
        self.int_range = Some((min, max));
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Computed attributes that cannot appear in configuration.
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }
}
