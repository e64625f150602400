//! Wire types for the Okta management API.
//!
//! Field names and enum spellings are fixed by the remote service. Optional
//! fields are skipped when unset so update payloads only carry what the
//! resource adapters actually built.

pub mod group;
pub mod mapping;
pub mod policy;
pub mod rule;
pub mod user;
pub mod user_schema;

pub use group::{Group, GroupProfile};
pub use mapping::{MappingProperty, MappingSource, ProfileMapping, PushStatus};
pub use policy::{
    AuthProviderCondition, IncludeExclude, PasswordAge, PasswordComplexity, PasswordLockout,
    PasswordSettings, PeopleCondition, Policy, PolicyConditions, PolicySettings, PolicyType,
    RecoveryFactors, RecoverySettings, Status,
};
pub use rule::{
    AccessAction, AuthContextCondition, NetworkCondition, PolicyRule, RuleActions,
    RuleConditions, SessionAction, SignOnAction,
};
pub use user::{ADMIN_ROLE_TYPES, Role, User, UserProfile};
pub use user_schema::{SubSchema, SubschemaKind, UserSchema, UserSchemaProperty};

use serde::{Deserialize, Serialize};

/// Access decision shared by rule actions.
pub const ALLOW: &str = "ALLOW";
pub const DENY: &str = "DENY";

/// `{"status": "ACTIVE"}` style wrapper used throughout policy settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHolder {
    pub status: String,
}

impl StatusHolder {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}
