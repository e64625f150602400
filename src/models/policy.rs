//! Policy objects.

use super::StatusHolder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Name Okta gives the built-in policy of each type.
pub const DEFAULT_POLICY_NAME: &str = "Default Policy";

/// Policy (and policy rule) type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolicyType {
    #[serde(rename = "OKTA_SIGN_ON")]
    OktaSignOn,
    #[serde(rename = "PASSWORD")]
    Password,
    #[serde(rename = "MFA_ENROLL")]
    MfaEnroll,
    #[serde(rename = "OAUTH_AUTHORIZATION_POLICY")]
    OAuthAuthorization,
}

impl PolicyType {
    pub const ALL: [&'static str; 4] = [
        "OKTA_SIGN_ON",
        "PASSWORD",
        "MFA_ENROLL",
        "OAUTH_AUTHORIZATION_POLICY",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OktaSignOn => "OKTA_SIGN_ON",
            Self::Password => "PASSWORD",
            Self::MfaEnroll => "MFA_ENROLL",
            Self::OAuthAuthorization => "OAUTH_AUTHORIZATION_POLICY",
        }
    }
}

impl fmt::Display for PolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PolicyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OKTA_SIGN_ON" => Ok(Self::OktaSignOn),
            "PASSWORD" => Ok(Self::Password),
            "MFA_ENROLL" => Ok(Self::MfaEnroll),
            "OAUTH_AUTHORIZATION_POLICY" => Ok(Self::OAuthAuthorization),
            other => Err(format!("unknown policy type '{}'", other)),
        }
    }
}

/// Lifecycle status of a policy or rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    Active,
    Inactive,
}

impl Status {
    pub const ALL: [&'static str; 2] = ["ACTIVE", "INACTIVE"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "INACTIVE" => Ok(Self::Inactive),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub policy_type: PolicyType,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default)]
    pub system: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<PolicyConditions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<PolicySettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Policy {
    /// An empty policy template of the given type.
    pub fn new(policy_type: PolicyType, name: impl Into<String>) -> Self {
        Self {
            id: None,
            policy_type,
            name: name.into(),
            description: None,
            priority: None,
            status: None,
            system: false,
            conditions: None,
            settings: None,
            created: None,
            last_updated: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyConditions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people: Option<PeopleCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_provider: Option<AuthProviderCondition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeopleCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<IncludeExclude>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<IncludeExclude>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncludeExclude {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

impl IncludeExclude {
    pub fn include(ids: Vec<String>) -> Self {
        Self {
            include: ids,
            exclude: Vec::new(),
        }
    }

    pub fn exclude(ids: Vec<String>) -> Self {
        Self {
            include: Vec::new(),
            exclude: ids,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthProviderCondition {
    pub provider: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<PasswordSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery: Option<RecoverySettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegation: Option<DelegationSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PasswordSettings {
    pub complexity: PasswordComplexity,
    pub age: PasswordAge,
    pub lockout: PasswordLockout,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordComplexity {
    pub min_length: i64,
    pub min_lower_case: i64,
    pub min_upper_case: i64,
    pub min_number: i64,
    pub min_symbol: i64,
    pub exclude_username: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_attributes: Vec<String>,
    pub dictionary: PasswordDictionary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PasswordDictionary {
    pub common: CommonDictionary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommonDictionary {
    pub exclude: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordAge {
    pub max_age_days: i64,
    pub expire_warn_days: i64,
    pub min_age_minutes: i64,
    pub history_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordLockout {
    pub max_attempts: i64,
    pub auto_unlock_minutes: i64,
    pub show_lockout_failures: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoverySettings {
    pub factors: RecoveryFactors,
}

// Factor keys are snake_case on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryFactors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_question: Option<RecoveryQuestionFactor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub okta_email: Option<EmailFactor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub okta_sms: Option<StatusHolder>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryQuestionFactor {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<RecoveryQuestionProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoveryQuestionProperties {
    pub complexity: AnswerComplexity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerComplexity {
    pub min_length: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailFactor {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<EmailFactorProperties>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailFactorProperties {
    pub recovery_token: RecoveryToken,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryToken {
    pub token_lifetime_minutes: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DelegationSettings {
    pub options: DelegationOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationOptions {
    pub skip_unlock: bool,
}
