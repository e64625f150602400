//! Per-instance working data handed to resource handlers.
//!
//! [`ResourceData`] holds the instance ID, the attribute values being applied
//! and, for existing instances, the attribute values recorded by the previous
//! apply. Handlers read declared values with the typed getters, detect
//! changes with [`has_change`](ResourceData::has_change), and write computed
//! values back with [`set`](ResourceData::set).
//!
//! Attribute paths use dotted notation. Numeric segments index into lists;
//! blocks are lists with a single element, so `settings.0.password.0.minlength`
//! addresses the minimum length inside the password settings block.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Recorded state of one resource instance after an apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceState {
    /// Remote object identifier
    pub id: String,
    /// Attribute values, including computed ones
    pub attributes: Value,
}

/// Working data for one resource instance during a lifecycle operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceData {
    id: Option<String>,
    attributes: Value,
    prior: Option<Value>,
    partial: bool,
}

/// The view of an instance handed to diff customisation.
pub type ResourceDiff = ResourceData;

impl ResourceData {
    /// Data for a planned change: `config` is the declared configuration and
    /// `prior` the state recorded for the instance, if any.
    pub fn new(config: Value, prior: Option<&InstanceState>) -> Self {
        Self {
            id: prior.map(|p| p.id.clone()),
            attributes: object_or_empty(config),
            prior: prior.map(|p| p.attributes.clone()),
            partial: false,
        }
    }

    /// Data for an existing instance with no pending change (refresh, delete).
    pub fn from_state(state: &InstanceState) -> Self {
        Self {
            id: Some(state.id.clone()),
            attributes: object_or_empty(state.attributes.clone()),
            prior: Some(state.attributes.clone()),
            partial: false,
        }
    }

    /// Data for an instance adopted by ID, with no attributes known yet.
    pub fn for_import(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            attributes: Value::Object(Map::new()),
            prior: None,
            partial: false,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Record the remote identifier of the instance.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Mark the instance as gone; it will be dropped from state.
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// Whether the instance has no recorded prior state.
    pub fn is_new(&self) -> bool {
        self.prior.is_none()
    }

    /// Raw value at a path. `null` counts as absent.
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup(&self.attributes, path).filter(|v| !v.is_null())
    }

    /// Value at a path when it is set: present, non-null and not an empty list.
    ///
    /// Explicit `0`, `false` and `""` count as set.
    pub fn get_ok(&self, path: &str) -> Option<&Value> {
        self.get(path)
            .filter(|v| !v.as_array().is_some_and(|items| items.is_empty()))
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// String value, or `""` when absent.
    pub fn get_string(&self, path: &str) -> String {
        self.get_str(path).unwrap_or_default().to_string()
    }

    pub fn get_int(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(Value::as_i64)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    /// List of strings; absent lists are empty.
    pub fn get_string_list(&self, path: &str) -> Vec<String> {
        self.get(path)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of elements at a list or block path.
    pub fn len(&self, path: &str) -> usize {
        match self.get(path) {
            Some(Value::Array(items)) => items.len(),
            Some(Value::Object(_)) => 1,
            _ => 0,
        }
    }

    /// Whether the value at a path differs from the prior state.
    ///
    /// New instances report a change for every attribute that is set.
    pub fn has_change(&self, path: &str) -> bool {
        let (old, new) = self.get_change(path);
        old != new
    }

    /// Prior and current values at a path.
    pub fn get_change(&self, path: &str) -> (Option<Value>, Option<Value>) {
        let old = self
            .prior
            .as_ref()
            .and_then(|prior| lookup(prior, path))
            .filter(|v| !v.is_null())
            .cloned();
        (old, self.get(path).cloned())
    }

    /// Set a top-level attribute.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        if let Some(object) = self.attributes.as_object_mut() {
            object.insert(key.to_string(), value.into());
        }
    }

    /// Enable or disable partial state mode.
    ///
    /// While partial, a failed operation keeps the prior attribute values
    /// instead of the ones being applied.
    pub fn partial(&mut self, enabled: bool) {
        self.partial = enabled;
    }

    /// All current attribute values.
    pub fn attributes(&self) -> &Value {
        &self.attributes
    }

    /// State to record, or `None` when the instance no longer exists.
    pub fn into_state(self) -> Option<InstanceState> {
        let id = self.id?;
        Some(InstanceState {
            id,
            attributes: self.attributes,
        })
    }

    /// State to record after a failed operation.
    pub fn into_failed_state(self) -> Option<InstanceState> {
        let id = self.id?;
        let attributes = match (self.partial, self.prior) {
            (true, Some(prior)) => prior,
            _ => self.attributes,
        };
        Some(InstanceState { id, attributes })
    }
}

fn object_or_empty(value: Value) -> Value {
    if value.is_object() {
        value
    } else {
        Value::Object(Map::new())
    }
}

/// Resolve a dotted path. A `0` segment applied to an object yields the
/// object itself, so single blocks written without a list still resolve.
fn lookup<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = data;
    for part in path.split('.') {
        current = match (part.parse::<usize>(), current) {
            (Ok(index), Value::Array(items)) => items.get(index)?,
            (Ok(0), Value::Object(_)) => current,
            _ => current.get(part)?,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data() -> ResourceData {
        ResourceData::new(
            json!({
                "name": "p1",
                "priority": 0,
                "groups": [],
                "settings": [{ "password": [{ "minlength": 10, "excludeusername": false }] }],
                "conditions": { "groups": ["00g1", "00g2"] },
                "description": null
            }),
            None,
        )
    }

    #[test]
    fn test_path_lookup() {
        let d = data();
        assert_eq!(d.get_int("settings.0.password.0.minlength"), Some(10));
        assert_eq!(d.get_bool("settings.0.password.0.excludeusername"), Some(false));
        assert_eq!(d.get_string_list("conditions.0.groups"), vec!["00g1", "00g2"]);
        assert_eq!(d.len("settings.0.password"), 1);
        assert!(d.get("settings.1").is_none());
        assert!(d.get("settings.0.password.0.maxagedays").is_none());
    }

    #[test]
    fn test_get_ok_treats_explicit_zero_as_set() {
        let d = data();
        assert_eq!(d.get_ok("priority"), Some(&json!(0)));
        assert_eq!(d.get_ok("settings.0.password.0.excludeusername"), Some(&json!(false)));
        assert!(d.get_ok("groups").is_none());
        assert!(d.get_ok("description").is_none());
        assert!(d.get_ok("missing").is_none());
    }

    #[test]
    fn test_changes_against_prior_state() {
        let prior = InstanceState {
            id: "00p1".to_string(),
            attributes: json!({ "name": "p1", "status": "ACTIVE" }),
        };
        let d = ResourceData::new(json!({ "name": "p1", "status": "INACTIVE" }), Some(&prior));

        assert_eq!(d.id(), Some("00p1"));
        assert!(!d.is_new());
        assert!(!d.has_change("name"));
        assert!(d.has_change("status"));
        assert_eq!(
            d.get_change("status"),
            (Some(json!("ACTIVE")), Some(json!("INACTIVE")))
        );
    }

    #[test]
    fn test_new_instance_reports_set_attributes_as_changed() {
        let d = ResourceData::new(json!({ "name": "p1" }), None);
        assert!(d.is_new());
        assert!(d.has_change("name"));
        assert!(!d.has_change("description"));
    }

    #[test]
    fn test_cleared_id_drops_state() {
        let mut d = data();
        d.set_id("00p1");
        d.set("system", true);
        let state = d.clone().into_state().unwrap();
        assert_eq!(state.attributes["system"], json!(true));

        d.clear_id();
        assert!(d.into_state().is_none());
    }

    #[test]
    fn test_partial_keeps_prior_on_failure() {
        let prior = InstanceState {
            id: "00p1".to_string(),
            attributes: json!({ "name": "p1", "status": "ACTIVE" }),
        };
        let mut d = ResourceData::new(json!({ "name": "p1", "status": "INACTIVE" }), Some(&prior));
        d.partial(true);
        assert_eq!(d.into_failed_state().unwrap(), prior);
    }
}
