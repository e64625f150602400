//! In-process Okta tenant.
//!
//! [`InMemoryOkta`] implements [`OktaApi`] over plain collections guarded by a
//! tokio `RwLock`, and records every call it receives. It mirrors the remote
//! behaviours the resource handlers depend on:
//!
//! * created policies and rules start `ACTIVE`; updates keep status, ID and
//!   the system flag
//! * names are unique per policy type and per policy
//! * system policies and rules cannot be deleted
//! * deleting a user that is not `DEPROVISIONED` only deprovisions it
//! * partial schema and mapping updates merge, with `null` removing a key
//!
//! # Example Usage
//!
//! ```rust
//! use okta_provider::client::{InMemoryOkta, OktaApi};
//! use okta_provider::models::{Policy, PolicyType};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let okta = InMemoryOkta::new();
//! let created = okta
//!     .create_policy(&Policy::new(PolicyType::OktaSignOn, "contractors"))
//!     .await?;
//! okta.deactivate_policy(created.id.as_deref().unwrap_or_default()).await?;
//!
//! assert_eq!(okta.call_count("deactivate_policy").await, 1);
//! assert_eq!(okta.mutating_calls().await.len(), 2);
//! # Ok(())
//! # }
//! ```

use super::OktaApi;
use crate::error::{ApiError, ApiResult};
use crate::models::group::EVERYONE_GROUP;
use crate::models::policy::{
    AnswerComplexity, CommonDictionary, DelegationOptions, DelegationSettings, EmailFactor,
    EmailFactorProperties, PasswordDictionary, RecoveryQuestionFactor, RecoveryQuestionProperties,
    RecoveryToken,
};
use crate::models::user::DEPROVISIONED;
use crate::models::user_schema::SchemaDefinitions;
use crate::models::{
    AccessAction, AuthProviderCondition, Group, GroupProfile, IncludeExclude, MappingSource,
    NetworkCondition, PasswordAge, PasswordComplexity, PasswordLockout, PasswordSettings,
    PeopleCondition, Policy, PolicyConditions, PolicyRule, PolicySettings, PolicyType,
    ProfileMapping, RecoveryFactors, RecoverySettings, Role, RuleActions, RuleConditions,
    SessionAction, SignOnAction, Status, SubSchema, SubschemaKind, User, UserProfile, UserSchema,
    UserSchemaProperty,
};
use crate::models::StatusHolder;
use chrono::Utc;
use log::trace;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

const VALIDATION_ERROR_CODE: &str = "E0000001";
const FORBIDDEN_ERROR_CODE: &str = "E0000006";
const CONFLICT_ERROR_CODE: &str = "E0000090";

pub use crate::models::policy::DEFAULT_POLICY_NAME;
pub use crate::models::rule::DEFAULT_RULE_NAME;

/// One call received by [`InMemoryOkta`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCall {
    /// Name of the [`OktaApi`] method invoked
    pub operation: &'static str,
    /// Object the call addressed, e.g. a policy ID or `group/user`
    pub target: String,
}

impl ApiCall {
    /// Whether the call changes remote state.
    pub fn is_mutating(&self) -> bool {
        !(self.operation.starts_with("list_") || self.operation.starts_with("get_"))
    }
}

#[derive(Debug, Default)]
struct Tenant {
    policies: Vec<Policy>,
    rules: HashMap<String, Vec<PolicyRule>>,
    groups: Vec<Group>,
    memberships: HashMap<String, Vec<String>>,
    users: Vec<User>,
    roles: HashMap<String, Vec<Role>>,
    schema: UserSchema,
    mappings: Vec<ProfileMapping>,
}

impl Tenant {
    fn policy_mut(&mut self, policy_id: &str) -> ApiResult<&mut Policy> {
        self.policies
            .iter_mut()
            .find(|p| p.id.as_deref() == Some(policy_id))
            .ok_or_else(|| not_found("Policy", policy_id))
    }

    fn rules_mut(&mut self, policy_id: &str) -> ApiResult<&mut Vec<PolicyRule>> {
        if !self.policies.iter().any(|p| p.id.as_deref() == Some(policy_id)) {
            return Err(not_found("Policy", policy_id));
        }
        Ok(self.rules.entry(policy_id.to_string()).or_default())
    }

    fn rule_mut(&mut self, policy_id: &str, rule_id: &str) -> ApiResult<&mut PolicyRule> {
        self.rules_mut(policy_id)?
            .iter_mut()
            .find(|r| r.id.as_deref() == Some(rule_id))
            .ok_or_else(|| not_found("PolicyRule", rule_id))
    }

    fn user_mut(&mut self, user_id: &str) -> ApiResult<&mut User> {
        self.users
            .iter_mut()
            .find(|u| u.id.as_deref() == Some(user_id))
            .ok_or_else(|| not_found("User", user_id))
    }

    fn has_group(&self, group_id: &str) -> bool {
        self.groups.iter().any(|g| g.id == group_id)
    }

    fn has_user(&self, user_id: &str) -> bool {
        self.users.iter().any(|u| u.id.as_deref() == Some(user_id))
    }

    fn mapping_mut(&mut self, mapping_id: &str) -> ApiResult<&mut ProfileMapping> {
        self.mappings
            .iter_mut()
            .find(|m| m.id.as_deref() == Some(mapping_id))
            .ok_or_else(|| not_found("Mapping", mapping_id))
    }
}

/// Thread-safe in-memory Okta organization.
///
/// Cloning shares the same tenant and call log.
#[derive(Clone)]
pub struct InMemoryOkta {
    tenant: Arc<RwLock<Tenant>>,
    calls: Arc<Mutex<Vec<ApiCall>>>,
}

impl InMemoryOkta {
    /// Create an empty organization with no groups, policies or users.
    pub fn new() -> Self {
        Self {
            tenant: Arc::new(RwLock::new(Tenant::default())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create an organization seeded the way a fresh Okta org looks: the
    /// `Everyone` group, the system password and sign-on policies with their
    /// default rules, and the base user profile schema.
    pub async fn with_defaults() -> Self {
        let okta = Self::new();
        {
            let mut tenant = okta.tenant.write().await;
            let everyone = Group {
                id: okta_id("00g"),
                group_type: Some("BUILT_IN".to_string()),
                profile: GroupProfile {
                    name: EVERYONE_GROUP.to_string(),
                    description: Some("All users in your organization".to_string()),
                },
            };
            let everyone_id = everyone.id.clone();
            tenant.groups.push(everyone);

            for (policy, rule) in [
                default_password_policy(&everyone_id),
                default_sign_on_policy(&everyone_id),
            ] {
                if let Some(id) = policy.id.clone() {
                    tenant.rules.insert(id, vec![rule]);
                }
                tenant.policies.push(policy);
            }

            tenant.schema = default_user_schema();
        }
        okta
    }

    /// Add a group and return its ID.
    pub async fn insert_group(&self, name: &str) -> String {
        let group = Group {
            id: okta_id("00g"),
            group_type: Some("OKTA_GROUP".to_string()),
            profile: GroupProfile {
                name: name.to_string(),
                description: None,
            },
        };
        let id = group.id.clone();
        self.tenant.write().await.groups.push(group);
        id
    }

    /// Add an active user and return its ID.
    pub async fn insert_user(&self, profile: UserProfile) -> String {
        let id = okta_id("00u");
        let mut user = User::new(profile);
        user.id = Some(id.clone());
        user.status = Some("ACTIVE".to_string());
        user.created = Some(Utc::now());
        self.tenant.write().await.users.push(user);
        id
    }

    /// Add an empty profile mapping between two objects and return its ID.
    pub async fn insert_mapping(&self, source: MappingSource, target: MappingSource) -> String {
        let id = okta_id("prm");
        let mapping = ProfileMapping {
            id: Some(id.clone()),
            source: Some(source),
            target: Some(target),
            properties: Default::default(),
        };
        self.tenant.write().await.mappings.push(mapping);
        id
    }

    /// Look up a policy by type and name without recording a call.
    pub async fn find_policy(&self, policy_type: PolicyType, name: &str) -> Option<Policy> {
        self.tenant
            .read()
            .await
            .policies
            .iter()
            .find(|p| p.policy_type == policy_type && p.name == name)
            .cloned()
    }

    /// Look up a user without recording a call.
    pub async fn find_user(&self, user_id: &str) -> Option<User> {
        self.tenant
            .read()
            .await
            .users
            .iter()
            .find(|u| u.id.as_deref() == Some(user_id))
            .cloned()
    }

    /// Roles currently assigned to a user, without recording a call.
    pub async fn user_roles(&self, user_id: &str) -> Vec<Role> {
        self.tenant
            .read()
            .await
            .roles
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Every call received, in order.
    pub async fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().await.clone()
    }

    /// Calls that changed remote state, in order.
    pub async fn mutating_calls(&self) -> Vec<ApiCall> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.is_mutating())
            .cloned()
            .collect()
    }

    /// Number of calls made to one operation.
    pub async fn call_count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    /// Forget recorded calls (useful between test phases).
    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    async fn record(&self, operation: &'static str, target: impl Into<String>) {
        let call = ApiCall {
            operation,
            target: target.into(),
        };
        trace!("in-memory okta: {} {}", call.operation, call.target);
        self.calls.lock().await.push(call);
    }
}

impl Default for InMemoryOkta {
    fn default() -> Self {
        Self::new()
    }
}

impl OktaApi for InMemoryOkta {
    async fn list_policies(&self, policy_type: PolicyType) -> ApiResult<Vec<Policy>> {
        self.record("list_policies", policy_type.as_str()).await;
        let tenant = self.tenant.read().await;
        Ok(tenant
            .policies
            .iter()
            .filter(|p| p.policy_type == policy_type)
            .cloned()
            .collect())
    }

    async fn get_policy(&self, policy_id: &str) -> ApiResult<Option<Policy>> {
        self.record("get_policy", policy_id).await;
        let tenant = self.tenant.read().await;
        Ok(tenant
            .policies
            .iter()
            .find(|p| p.id.as_deref() == Some(policy_id))
            .cloned())
    }

    async fn create_policy(&self, policy: &Policy) -> ApiResult<Policy> {
        self.record("create_policy", policy.name.as_str()).await;
        let mut tenant = self.tenant.write().await;
        if tenant
            .policies
            .iter()
            .any(|p| p.policy_type == policy.policy_type && p.name == policy.name)
        {
            return Err(validation_failed(format!(
                "A policy named {} already exists",
                policy.name
            )));
        }

        let mut created = policy.clone();
        created.id = Some(okta_id("00p"));
        created.status = Some(Status::Active);
        created.system = false;
        if created.priority.is_none() {
            let count = tenant
                .policies
                .iter()
                .filter(|p| p.policy_type == policy.policy_type)
                .count();
            created.priority = Some(count as i64 + 1);
        }
        let now = Utc::now();
        created.created = Some(now);
        created.last_updated = Some(now);
        tenant.policies.push(created.clone());
        Ok(created)
    }

    async fn update_policy(&self, policy_id: &str, policy: &Policy) -> ApiResult<Policy> {
        self.record("update_policy", policy_id).await;
        let mut tenant = self.tenant.write().await;
        let existing = tenant.policy_mut(policy_id)?;
        if existing.policy_type != policy.policy_type {
            return Err(validation_failed("Policy type cannot be changed"));
        }

        let mut updated = policy.clone();
        updated.id = existing.id.clone();
        updated.status = existing.status;
        updated.system = existing.system;
        updated.created = existing.created;
        updated.last_updated = Some(Utc::now());
        if updated.priority.is_none() {
            updated.priority = existing.priority;
        }
        *existing = updated.clone();
        Ok(updated)
    }

    async fn delete_policy(&self, policy_id: &str) -> ApiResult<()> {
        self.record("delete_policy", policy_id).await;
        let mut tenant = self.tenant.write().await;
        if tenant.policy_mut(policy_id)?.system {
            return Err(forbidden("Cannot delete a default policy"));
        }
        tenant.policies.retain(|p| p.id.as_deref() != Some(policy_id));
        tenant.rules.remove(policy_id);
        Ok(())
    }

    async fn activate_policy(&self, policy_id: &str) -> ApiResult<()> {
        self.record("activate_policy", policy_id).await;
        let mut tenant = self.tenant.write().await;
        tenant.policy_mut(policy_id)?.status = Some(Status::Active);
        Ok(())
    }

    async fn deactivate_policy(&self, policy_id: &str) -> ApiResult<()> {
        self.record("deactivate_policy", policy_id).await;
        let mut tenant = self.tenant.write().await;
        tenant.policy_mut(policy_id)?.status = Some(Status::Inactive);
        Ok(())
    }

    async fn list_policy_rules(&self, policy_id: &str) -> ApiResult<Vec<PolicyRule>> {
        self.record("list_policy_rules", policy_id).await;
        let mut tenant = self.tenant.write().await;
        Ok(tenant.rules_mut(policy_id)?.clone())
    }

    async fn create_policy_rule(&self, policy_id: &str, rule: &PolicyRule) -> ApiResult<PolicyRule> {
        self.record("create_policy_rule", format!("{}/{}", policy_id, rule.name))
            .await;
        let mut tenant = self.tenant.write().await;
        let rules = tenant.rules_mut(policy_id)?;
        if rules.iter().any(|r| r.name == rule.name) {
            return Err(validation_failed(format!(
                "A rule named {} already exists",
                rule.name
            )));
        }

        let mut created = rule.clone();
        created.id = Some(okta_id("0pr"));
        created.status = Some(Status::Active);
        created.system = false;
        if created.priority.is_none() {
            created.priority = Some(rules.len() as i64 + 1);
        }
        rules.push(created.clone());
        Ok(created)
    }

    async fn update_policy_rule(
        &self,
        policy_id: &str,
        rule_id: &str,
        rule: &PolicyRule,
    ) -> ApiResult<PolicyRule> {
        self.record("update_policy_rule", format!("{}/{}", policy_id, rule_id))
            .await;
        let mut tenant = self.tenant.write().await;
        let existing = tenant.rule_mut(policy_id, rule_id)?;
        let mut updated = rule.clone();
        updated.id = existing.id.clone();
        updated.status = existing.status;
        updated.system = existing.system;
        if updated.priority.is_none() {
            updated.priority = existing.priority;
        }
        *existing = updated.clone();
        Ok(updated)
    }

    async fn delete_policy_rule(&self, policy_id: &str, rule_id: &str) -> ApiResult<()> {
        self.record("delete_policy_rule", format!("{}/{}", policy_id, rule_id))
            .await;
        let mut tenant = self.tenant.write().await;
        if tenant.rule_mut(policy_id, rule_id)?.system {
            return Err(forbidden("Cannot delete a default rule"));
        }
        tenant
            .rules_mut(policy_id)?
            .retain(|r| r.id.as_deref() != Some(rule_id));
        Ok(())
    }

    async fn activate_policy_rule(&self, policy_id: &str, rule_id: &str) -> ApiResult<()> {
        self.record("activate_policy_rule", format!("{}/{}", policy_id, rule_id))
            .await;
        let mut tenant = self.tenant.write().await;
        tenant.rule_mut(policy_id, rule_id)?.status = Some(Status::Active);
        Ok(())
    }

    async fn deactivate_policy_rule(&self, policy_id: &str, rule_id: &str) -> ApiResult<()> {
        self.record("deactivate_policy_rule", format!("{}/{}", policy_id, rule_id))
            .await;
        let mut tenant = self.tenant.write().await;
        tenant.rule_mut(policy_id, rule_id)?.status = Some(Status::Inactive);
        Ok(())
    }

    async fn list_groups(&self, query: &str) -> ApiResult<Vec<Group>> {
        self.record("list_groups", query).await;
        let tenant = self.tenant.read().await;
        // Okta's `q` parameter is a name prefix match.
        Ok(tenant
            .groups
            .iter()
            .filter(|g| g.profile.name.starts_with(query))
            .cloned()
            .collect())
    }

    async fn list_group_users(&self, group_id: &str) -> ApiResult<Vec<User>> {
        self.record("list_group_users", group_id).await;
        let tenant = self.tenant.read().await;
        if !tenant.has_group(group_id) {
            return Err(not_found("Group", group_id));
        }
        let members = tenant.memberships.get(group_id).cloned().unwrap_or_default();
        Ok(tenant
            .users
            .iter()
            .filter(|u| {
                u.id
                    .as_ref()
                    .is_some_and(|id| members.iter().any(|m| m == id))
            })
            .cloned()
            .collect())
    }

    async fn list_user_groups(&self, user_id: &str) -> ApiResult<Vec<Group>> {
        self.record("list_user_groups", user_id).await;
        let tenant = self.tenant.read().await;
        if !tenant.has_user(user_id) {
            return Err(not_found("User", user_id));
        }
        Ok(tenant
            .groups
            .iter()
            .filter(|g| {
                tenant
                    .memberships
                    .get(&g.id)
                    .is_some_and(|members| members.iter().any(|m| m == user_id))
            })
            .cloned()
            .collect())
    }

    async fn add_user_to_group(&self, group_id: &str, user_id: &str) -> ApiResult<()> {
        self.record("add_user_to_group", format!("{}/{}", group_id, user_id))
            .await;
        let mut tenant = self.tenant.write().await;
        if !tenant.has_group(group_id) {
            return Err(not_found("Group", group_id));
        }
        if !tenant.has_user(user_id) {
            return Err(not_found("User", user_id));
        }
        let members = tenant.memberships.entry(group_id.to_string()).or_default();
        if !members.iter().any(|m| m == user_id) {
            members.push(user_id.to_string());
        }
        Ok(())
    }

    async fn remove_user_from_group(&self, group_id: &str, user_id: &str) -> ApiResult<()> {
        self.record("remove_user_from_group", format!("{}/{}", group_id, user_id))
            .await;
        let mut tenant = self.tenant.write().await;
        if !tenant.has_group(group_id) {
            return Err(not_found("Group", group_id));
        }
        if let Some(members) = tenant.memberships.get_mut(group_id) {
            members.retain(|m| m != user_id);
        }
        Ok(())
    }

    async fn list_users_by_email(&self, email: &str) -> ApiResult<Vec<User>> {
        self.record("list_users_by_email", email).await;
        let tenant = self.tenant.read().await;
        Ok(tenant
            .users
            .iter()
            .filter(|u| u.profile.email == email)
            .cloned()
            .collect())
    }

    async fn get_user(&self, user_id: &str) -> ApiResult<Option<User>> {
        self.record("get_user", user_id).await;
        let tenant = self.tenant.read().await;
        Ok(tenant
            .users
            .iter()
            .find(|u| u.id.as_deref() == Some(user_id))
            .cloned())
    }

    async fn create_user(&self, user: &User, activate: bool) -> ApiResult<User> {
        self.record("create_user", user.profile.login.as_str()).await;
        let mut tenant = self.tenant.write().await;
        if tenant
            .users
            .iter()
            .any(|u| u.profile.login == user.profile.login)
        {
            return Err(validation_failed(
                "login: An object with this field already exists",
            ));
        }

        let mut created = user.clone();
        created.id = Some(okta_id("00u"));
        created.status = Some(if activate { "ACTIVE" } else { "STAGED" }.to_string());
        let now = Utc::now();
        created.created = Some(now);
        created.last_updated = Some(now);
        tenant.users.push(created.clone());
        Ok(created)
    }

    async fn update_user(&self, user_id: &str, user: &User) -> ApiResult<User> {
        self.record("update_user", user_id).await;
        let mut tenant = self.tenant.write().await;
        let existing = tenant.user_mut(user_id)?;
        existing.profile = user.profile.clone();
        existing.last_updated = Some(Utc::now());
        Ok(existing.clone())
    }

    async fn deactivate_user(&self, user_id: &str) -> ApiResult<()> {
        self.record("deactivate_user", user_id).await;
        let mut tenant = self.tenant.write().await;
        tenant.user_mut(user_id)?.status = Some(DEPROVISIONED.to_string());
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> ApiResult<()> {
        self.record("delete_user", user_id).await;
        let mut tenant = self.tenant.write().await;
        let user = tenant.user_mut(user_id)?;
        if user.status.as_deref() != Some(DEPROVISIONED) {
            user.status = Some(DEPROVISIONED.to_string());
            return Ok(());
        }
        tenant.users.retain(|u| u.id.as_deref() != Some(user_id));
        tenant.roles.remove(user_id);
        for members in tenant.memberships.values_mut() {
            members.retain(|m| m != user_id);
        }
        Ok(())
    }

    async fn list_roles(&self, user_id: &str) -> ApiResult<Vec<Role>> {
        self.record("list_roles", user_id).await;
        let tenant = self.tenant.read().await;
        if !tenant.has_user(user_id) {
            return Err(not_found("User", user_id));
        }
        Ok(tenant.roles.get(user_id).cloned().unwrap_or_default())
    }

    async fn assign_role(&self, user_id: &str, role_type: &str) -> ApiResult<Role> {
        self.record("assign_role", format!("{}/{}", user_id, role_type))
            .await;
        let mut tenant = self.tenant.write().await;
        if !tenant.has_user(user_id) {
            return Err(not_found("User", user_id));
        }
        let roles = tenant.roles.entry(user_id.to_string()).or_default();
        if roles.iter().any(|r| r.role_type == role_type) {
            return Err(ApiError::http(
                409,
                Some(CONFLICT_ERROR_CODE),
                "The role specified is already assigned to the user.",
            ));
        }
        let role = Role {
            id: okta_id("ra1"),
            role_type: role_type.to_string(),
            status: Some("ACTIVE".to_string()),
            label: None,
        };
        roles.push(role.clone());
        Ok(role)
    }

    async fn unassign_role(&self, user_id: &str, role_id: &str) -> ApiResult<()> {
        self.record("unassign_role", format!("{}/{}", user_id, role_id))
            .await;
        let mut tenant = self.tenant.write().await;
        let roles = tenant
            .roles
            .get_mut(user_id)
            .ok_or_else(|| not_found("Role", role_id))?;
        let before = roles.len();
        roles.retain(|r| r.id != role_id);
        if roles.len() == before {
            return Err(not_found("Role", role_id));
        }
        Ok(())
    }

    async fn get_user_schema(&self) -> ApiResult<UserSchema> {
        self.record("get_user_schema", "default").await;
        Ok(self.tenant.read().await.schema.clone())
    }

    async fn update_user_schema(&self, schema: &UserSchema) -> ApiResult<UserSchema> {
        self.record("update_user_schema", "default").await;
        let mut tenant = self.tenant.write().await;
        for kind in [SubschemaKind::Base, SubschemaKind::Custom] {
            let Some(partial) = schema.subschema(kind) else {
                continue;
            };
            let target = match kind {
                SubschemaKind::Base => &mut tenant.schema.definitions.base,
                SubschemaKind::Custom => &mut tenant.schema.definitions.custom,
            };
            let target = target.get_or_insert_with(|| SubSchema::new(kind));
            for (name, property) in &partial.properties {
                match property {
                    Some(property) => {
                        target.properties.insert(name.clone(), Some(property.clone()));
                    }
                    None if kind == SubschemaKind::Custom => {
                        target.properties.remove(name);
                    }
                    None => {
                        return Err(validation_failed(format!(
                            "Base property {} cannot be removed",
                            name
                        )));
                    }
                }
            }
        }
        Ok(tenant.schema.clone())
    }

    async fn list_mappings_by_source(&self, source_id: &str) -> ApiResult<Vec<ProfileMapping>> {
        self.record("list_mappings_by_source", source_id).await;
        let tenant = self.tenant.read().await;
        Ok(tenant
            .mappings
            .iter()
            .filter(|m| m.source.as_ref().is_some_and(|s| s.id == source_id))
            .cloned()
            .collect())
    }

    async fn get_mapping(&self, mapping_id: &str) -> ApiResult<Option<ProfileMapping>> {
        self.record("get_mapping", mapping_id).await;
        let tenant = self.tenant.read().await;
        Ok(tenant
            .mappings
            .iter()
            .find(|m| m.id.as_deref() == Some(mapping_id))
            .cloned())
    }

    async fn update_mapping(
        &self,
        mapping_id: &str,
        mapping: &ProfileMapping,
    ) -> ApiResult<ProfileMapping> {
        self.record("update_mapping", mapping_id).await;
        let mut tenant = self.tenant.write().await;
        let existing = tenant.mapping_mut(mapping_id)?;
        for (key, property) in &mapping.properties {
            match property {
                Some(property) => {
                    existing.properties.insert(key.clone(), Some(property.clone()));
                }
                None => {
                    existing.properties.remove(key);
                }
            }
        }
        Ok(existing.clone())
    }
}

/// Okta-style object ID: a three character prefix and 17 random characters.
fn okta_id(prefix: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, &random[..17])
}

fn not_found(kind: &str, id: &str) -> ApiError {
    ApiError::not_found(format!("Not found: Resource not found: {} ({})", id, kind))
}

fn validation_failed(message: impl Into<String>) -> ApiError {
    ApiError::http(
        400,
        Some(VALIDATION_ERROR_CODE),
        format!("Api validation failed: {}", message.into()),
    )
}

fn forbidden(message: &str) -> ApiError {
    ApiError::http(
        403,
        Some(FORBIDDEN_ERROR_CODE),
        format!("You do not have permission to perform the requested action: {}", message),
    )
}

fn everyone_condition(everyone_id: &str) -> PolicyConditions {
    PolicyConditions {
        people: Some(PeopleCondition {
            groups: Some(IncludeExclude::include(vec![everyone_id.to_string()])),
            users: None,
        }),
        auth_provider: None,
    }
}

fn default_password_policy(everyone_id: &str) -> (Policy, PolicyRule) {
    let mut policy = Policy::new(PolicyType::Password, DEFAULT_POLICY_NAME);
    policy.id = Some(okta_id("00p"));
    policy.description = Some("The default policy applies in all situations if no other policy applies.".to_string());
    policy.priority = Some(1);
    policy.status = Some(Status::Active);
    policy.system = true;
    let mut conditions = everyone_condition(everyone_id);
    conditions.auth_provider = Some(AuthProviderCondition {
        provider: "OKTA".to_string(),
        include: Vec::new(),
    });
    policy.conditions = Some(conditions);
    policy.settings = Some(PolicySettings {
        password: Some(PasswordSettings {
            complexity: PasswordComplexity {
                min_length: 8,
                min_lower_case: 1,
                min_upper_case: 1,
                min_number: 1,
                min_symbol: 0,
                exclude_username: true,
                exclude_attributes: Vec::new(),
                dictionary: PasswordDictionary {
                    common: CommonDictionary { exclude: false },
                },
            },
            age: PasswordAge::default(),
            lockout: PasswordLockout {
                max_attempts: 10,
                auto_unlock_minutes: 0,
                show_lockout_failures: false,
            },
        }),
        recovery: Some(RecoverySettings {
            factors: RecoveryFactors {
                recovery_question: Some(RecoveryQuestionFactor {
                    status: "ACTIVE".to_string(),
                    properties: Some(RecoveryQuestionProperties {
                        complexity: AnswerComplexity { min_length: 4 },
                    }),
                }),
                okta_email: Some(EmailFactor {
                    status: "ACTIVE".to_string(),
                    properties: Some(EmailFactorProperties {
                        recovery_token: RecoveryToken {
                            token_lifetime_minutes: 60,
                        },
                    }),
                }),
                okta_sms: Some(StatusHolder::new("INACTIVE")),
            },
        }),
        delegation: Some(DelegationSettings {
            options: DelegationOptions { skip_unlock: false },
        }),
    });

    let mut rule = PolicyRule::new(PolicyType::Password, DEFAULT_RULE_NAME);
    rule.id = Some(okta_id("0pr"));
    rule.priority = Some(1);
    rule.status = Some(Status::Active);
    rule.system = true;
    rule.actions = Some(RuleActions {
        password_change: Some(AccessAction::new("ALLOW")),
        self_service_password_reset: Some(AccessAction::new("ALLOW")),
        self_service_unlock: Some(AccessAction::new("DENY")),
        signon: None,
    });
    (policy, rule)
}

fn default_sign_on_policy(everyone_id: &str) -> (Policy, PolicyRule) {
    let mut policy = Policy::new(PolicyType::OktaSignOn, DEFAULT_POLICY_NAME);
    policy.id = Some(okta_id("00p"));
    policy.description = Some("The default policy applies in all situations if no other policy applies.".to_string());
    policy.priority = Some(1);
    policy.status = Some(Status::Active);
    policy.system = true;
    policy.conditions = Some(everyone_condition(everyone_id));

    let mut rule = PolicyRule::new(PolicyType::OktaSignOn, DEFAULT_RULE_NAME);
    rule.id = Some(okta_id("0pr"));
    rule.priority = Some(1);
    rule.status = Some(Status::Active);
    rule.system = true;
    rule.conditions = Some(RuleConditions {
        people: None,
        network: Some(NetworkCondition {
            connection: "ANYWHERE".to_string(),
            include: Vec::new(),
            exclude: Vec::new(),
        }),
        auth_context: None,
    });
    rule.actions = Some(RuleActions {
        signon: Some(SignOnAction {
            access: "ALLOW".to_string(),
            require_factor: false,
            factor_prompt_mode: None,
            remember_device_by_default: None,
            factor_lifetime: None,
            session: SessionAction {
                max_session_idle_minutes: 120,
                max_session_lifetime_minutes: 0,
                use_persistent_cookie: false,
            },
        }),
        ..Default::default()
    });
    (policy, rule)
}

fn default_user_schema() -> UserSchema {
    let mut base = SubSchema::new(SubschemaKind::Base);
    for (name, title) in [
        ("login", "Username"),
        ("email", "Primary email"),
        ("firstName", "First name"),
        ("lastName", "Last name"),
    ] {
        base.properties.insert(
            name.to_string(),
            Some(UserSchemaProperty {
                title: title.to_string(),
                property_type: "string".to_string(),
                required: Some(true),
                ..Default::default()
            }),
        );
    }
    base.required = vec![
        "login".to_string(),
        "email".to_string(),
        "firstName".to_string(),
        "lastName".to_string(),
    ];

    UserSchema {
        id: Some("#default".to_string()),
        definitions: SchemaDefinitions {
            base: Some(base),
            custom: Some(SubSchema::new(SubschemaKind::Custom)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_defaults_seed_system_policies() {
        let okta = InMemoryOkta::with_defaults().await;

        let password = okta.list_policies(PolicyType::Password).await.unwrap();
        assert_eq!(password.len(), 1);
        assert!(password[0].system);

        let groups = okta.list_groups(EVERYONE_GROUP).await.unwrap();
        assert_eq!(groups.len(), 1);

        let policy_id = password[0].id.clone().unwrap();
        let rules = okta.list_policy_rules(&policy_id).await.unwrap();
        assert_eq!(rules[0].name, DEFAULT_RULE_NAME);
        assert!(okta.mutating_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_system_policy_cannot_be_deleted() {
        let okta = InMemoryOkta::with_defaults().await;
        let policy = okta
            .find_policy(PolicyType::OktaSignOn, DEFAULT_POLICY_NAME)
            .await
            .unwrap();

        let error = okta
            .delete_policy(policy.id.as_deref().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(error, ApiError::Http { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_duplicate_policy_names_rejected() {
        let okta = InMemoryOkta::new();
        let policy = Policy::new(PolicyType::Password, "p1");
        okta.create_policy(&policy).await.unwrap();
        assert!(okta.create_policy(&policy).await.is_err());

        // Same name under another type is fine
        okta.create_policy(&Policy::new(PolicyType::OktaSignOn, "p1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_keeps_status() {
        let okta = InMemoryOkta::new();
        let created = okta
            .create_policy(&Policy::new(PolicyType::Password, "p1"))
            .await
            .unwrap();
        let id = created.id.clone().unwrap();
        okta.deactivate_policy(&id).await.unwrap();

        let mut replacement = Policy::new(PolicyType::Password, "p1");
        replacement.description = Some("changed".to_string());
        replacement.status = Some(Status::Active);
        let updated = okta.update_policy(&id, &replacement).await.unwrap();
        assert_eq!(updated.status, Some(Status::Inactive));
        assert_eq!(updated.description.as_deref(), Some("changed"));
    }

    #[tokio::test]
    async fn test_user_delete_deprovisions_first() {
        let okta = InMemoryOkta::new();
        let id = okta
            .insert_user(UserProfile {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                login: "ada@example.com".to_string(),
            })
            .await;

        okta.delete_user(&id).await.unwrap();
        assert_eq!(
            okta.find_user(&id).await.unwrap().status.as_deref(),
            Some(DEPROVISIONED)
        );
        okta.delete_user(&id).await.unwrap();
        assert!(okta.find_user(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_schema_update_merges_and_removes() {
        let okta = InMemoryOkta::with_defaults().await;
        let property = UserSchemaProperty {
            title: "Cost center".to_string(),
            property_type: "string".to_string(),
            ..Default::default()
        };
        let schema = okta
            .update_user_schema(&UserSchema::custom_property("costCenter", Some(property)))
            .await
            .unwrap();
        assert_eq!(schema.property_names(SubschemaKind::Custom), vec!["costCenter"]);

        let schema = okta
            .update_user_schema(&UserSchema::custom_property("costCenter", None))
            .await
            .unwrap();
        assert!(schema.property_names(SubschemaKind::Custom).is_empty());
        assert_eq!(schema.property_names(SubschemaKind::Base).len(), 4);
    }

    #[test]
    fn test_okta_id_shape() {
        let id = okta_id("00u");
        assert_eq!(id.len(), 20);
        assert!(id.starts_with("00u"));
    }
}
