//! Policy rule objects.

use super::policy::{PeopleCondition, PolicyType, Status};
use serde::{Deserialize, Serialize};

/// Name of the built-in rule every policy carries.
pub const DEFAULT_RULE_NAME: &str = "Default Rule";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub rule_type: PolicyType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default)]
    pub system: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<RuleConditions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<RuleActions>,
}

impl PolicyRule {
    pub fn new(rule_type: PolicyType, name: impl Into<String>) -> Self {
        Self {
            id: None,
            rule_type,
            name: name.into(),
            priority: None,
            status: None,
            system: false,
            conditions: None,
            actions: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people: Option<PeopleCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_context: Option<AuthContextCondition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkCondition {
    pub connection: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContextCondition {
    pub auth_type: String,
}

/// Rule actions. Password rules use the three self-service actions; sign-on
/// rules use `signon`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleActions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_change: Option<AccessAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_service_password_reset: Option<AccessAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_service_unlock: Option<AccessAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signon: Option<SignOnAction>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessAction {
    pub access: String,
}

impl AccessAction {
    pub fn new(access: impl Into<String>) -> Self {
        Self {
            access: access.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOnAction {
    pub access: String,
    pub require_factor: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor_prompt_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remember_device_by_default: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factor_lifetime: Option<i64>,
    pub session: SessionAction,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAction {
    pub max_session_idle_minutes: i64,
    pub max_session_lifetime_minutes: i64,
    pub use_persistent_cookie: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_password_rule_serialization() {
        let mut rule = PolicyRule::new(PolicyType::Password, "allow reset");
        rule.actions = Some(RuleActions {
            password_change: Some(AccessAction::new("ALLOW")),
            self_service_password_reset: Some(AccessAction::new("ALLOW")),
            self_service_unlock: Some(AccessAction::new("DENY")),
            signon: None,
        });

        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["actions"]["selfServiceUnlock"]["access"], "DENY");
        assert!(value["actions"].get("signon").is_none());
    }

    #[test]
    fn test_signon_rule_deserialization() {
        let rule: PolicyRule = serde_json::from_value(json!({
            "id": "0prxyz",
            "type": "OKTA_SIGN_ON",
            "name": "Default Rule",
            "system": true,
            "conditions": { "network": { "connection": "ANYWHERE" } },
            "actions": {
                "signon": {
                    "access": "ALLOW",
                    "requireFactor": false,
                    "session": {
                        "maxSessionIdleMinutes": 120,
                        "maxSessionLifetimeMinutes": 0,
                        "usePersistentCookie": false
                    }
                }
            }
        }))
        .unwrap();

        assert!(rule.system);
        let session = rule.actions.unwrap().signon.unwrap().session;
        assert_eq!(session.max_session_idle_minutes, 120);
    }
}
