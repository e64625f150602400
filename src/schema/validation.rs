//! Validation of resource configuration against its schema.
//!
//! Checks run in declaration order and stop at the first failure: unknown
//! attributes, computed attributes set by the user, missing required
//! attributes, value types, allowed values, integer ranges and block counts.
//! Validation happens before diff customisation and before any remote call.

use super::types::{AttributeSchema, AttributeType, ResourceSchema};
use crate::error::{ValidationError, ValidationResult};
use serde_json::{Map, Value};

impl ResourceSchema {
    /// Validate a configuration object against this schema.
    pub fn validate(&self, config: &Value) -> ValidationResult<()> {
        let object = config
            .as_object()
            .ok_or_else(|| ValidationError::invalid_type(&self.name, "object", type_name(config)))?;
        validate_object(&self.name, &self.attributes, object, "")
    }

    /// Fill defaults for absent attributes and normalise single-object blocks
    /// into one-element lists.
    ///
    /// Defaults inside a block only apply when the block itself is present.
    pub fn apply_defaults(&self, config: &mut Value) {
        if let Some(object) = config.as_object_mut() {
            apply_object_defaults(&self.attributes, object);
        }
    }
}

fn validate_object(
    resource_type: &str,
    attributes: &[AttributeSchema],
    object: &Map<String, Value>,
    prefix: &str,
) -> ValidationResult<()> {
    for key in object.keys() {
        if !attributes.iter().any(|a| &a.name == key) {
            return Err(ValidationError::UnknownAttribute {
                attribute: format!("{}{}", prefix, key),
                resource_type: resource_type.to_string(),
            });
        }
    }

    for attr in attributes {
        let path = format!("{}{}", prefix, attr.name);
        let value = object.get(&attr.name).filter(|v| !v.is_null());

        match value {
            None if attr.required => return Err(ValidationError::missing_required(path)),
            None => {}
            Some(_) if attr.is_computed_only() => {
                return Err(ValidationError::custom(format!(
                    "attribute '{}' is computed and cannot be set",
                    path
                )));
            }
            Some(value) => validate_value(resource_type, attr, value, &path)?,
        }
    }

    Ok(())
}

fn validate_value(
    resource_type: &str,
    attr: &AttributeSchema,
    value: &Value,
    path: &str,
) -> ValidationResult<()> {
    match attr.data_type {
        AttributeType::String => {
            let s = value
                .as_str()
                .ok_or_else(|| ValidationError::invalid_type(path, "string", type_name(value)))?;
            validate_canonical(attr, s, path)
        }
        AttributeType::Int => {
            let n = value
                .as_i64()
                .ok_or_else(|| ValidationError::invalid_type(path, "int", type_name(value)))?;
            if let Some((min, max)) = attr.int_range {
                if n < min || n > max {
                    return Err(ValidationError::OutOfRange {
                        attribute: path.to_string(),
                        value: n,
                        min,
                        max,
                    });
                }
            }
            Ok(())
        }
        AttributeType::Bool => {
            if value.is_boolean() {
                Ok(())
            } else {
                Err(ValidationError::invalid_type(path, "bool", type_name(value)))
            }
        }
        AttributeType::List => {
            let items = value
                .as_array()
                .ok_or_else(|| ValidationError::invalid_type(path, "list", type_name(value)))?;
            for (index, item) in items.iter().enumerate() {
                let item_path = format!("{}.{}", path, index);
                let s = item.as_str().ok_or_else(|| {
                    ValidationError::invalid_type(&item_path, "string", type_name(item))
                })?;
                validate_canonical(attr, s, &item_path)?;
            }
            Ok(())
        }
        AttributeType::Block => {
            let blocks: Vec<&Map<String, Value>> = match value {
                Value::Object(object) => vec![object],
                Value::Array(items) => items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        item.as_object().ok_or_else(|| {
                            ValidationError::invalid_type(
                                format!("{}.{}", path, index),
                                "block",
                                type_name(item),
                            )
                        })
                    })
                    .collect::<ValidationResult<_>>()?,
                other => return Err(ValidationError::invalid_type(path, "block", type_name(other))),
            };

            if let Some(max) = attr.max_items {
                if blocks.len() > max {
                    return Err(ValidationError::TooManyItems {
                        attribute: path.to_string(),
                        max,
                    });
                }
            }

            for (index, block) in blocks.into_iter().enumerate() {
                let prefix = format!("{}.{}.", path, index);
                validate_object(resource_type, &attr.sub_attributes, block, &prefix)?;
            }
            Ok(())
        }
    }
}

fn validate_canonical(attr: &AttributeSchema, value: &str, path: &str) -> ValidationResult<()> {
    if !attr.canonical_values.is_empty() && !attr.canonical_values.iter().any(|v| v == value) {
        return Err(ValidationError::InvalidCanonicalValue {
            attribute: path.to_string(),
            value: value.to_string(),
            allowed: attr.canonical_values.clone(),
        });
    }
    Ok(())
}

fn apply_object_defaults(attributes: &[AttributeSchema], object: &mut Map<String, Value>) {
    for attr in attributes {
        let present = object.get(&attr.name).is_some_and(|v| !v.is_null());
        if !present {
            if let Some(default) = &attr.default {
                object.insert(attr.name.clone(), default.clone());
            }
            continue;
        }

        if attr.data_type != AttributeType::Block {
            continue;
        }
        if let Some(value) = object.get_mut(&attr.name) {
            if value.is_object() {
                let single = value.take();
                *value = Value::Array(vec![single]);
            }
            if let Value::Array(blocks) = value {
                for block in blocks.iter_mut() {
                    if let Some(block) = block.as_object_mut() {
                        apply_object_defaults(&attr.sub_attributes, block);
                    }
                }
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
