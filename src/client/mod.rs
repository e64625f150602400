//! Access to the Okta management API.
//!
//! [`OktaApi`] lists every remote call the resource handlers issue. Each call
//! is a single request/response; there is no retry, batching or pagination at
//! this layer.
//!
//! Two implementations ship with the crate:
//!
//! * [`HttpOktaClient`] - talks to a real organization over HTTPS
//! * [`InMemoryOkta`] - an in-process tenant that records every call, used by
//!   the test suite and for offline dry runs
//!
//! # Example Usage
//!
//! ```rust
//! use okta_provider::client::{InMemoryOkta, OktaApi};
//! use okta_provider::models::PolicyType;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let okta = InMemoryOkta::with_defaults().await;
//! let policies = okta.list_policies(PolicyType::Password).await?;
//! assert_eq!(policies[0].name, "Default Policy");
//! # Ok(())
//! # }
//! ```

pub mod http;
pub mod in_memory;

pub use http::HttpOktaClient;
pub use in_memory::{ApiCall, InMemoryOkta};

use crate::error::ApiResult;
use crate::models::{
    Group, Policy, PolicyRule, PolicyType, ProfileMapping, Role, User, UserSchema,
};
use std::future::Future;

/// Remote operations against one Okta organization.
///
/// Lookups that address a single object by ID return `Ok(None)` when the
/// object does not exist; every other failure is an [`ApiError`].
///
/// [`ApiError`]: crate::error::ApiError
pub trait OktaApi: Send + Sync + 'static {
    // Policies

    /// List all policies of a type.
    fn list_policies(
        &self,
        policy_type: PolicyType,
    ) -> impl Future<Output = ApiResult<Vec<Policy>>> + Send;

    fn get_policy(&self, policy_id: &str)
    -> impl Future<Output = ApiResult<Option<Policy>>> + Send;

    /// Create a policy. The remote creates it `ACTIVE`.
    fn create_policy(&self, policy: &Policy) -> impl Future<Output = ApiResult<Policy>> + Send;

    /// Replace a policy with the full object given.
    fn update_policy(
        &self,
        policy_id: &str,
        policy: &Policy,
    ) -> impl Future<Output = ApiResult<Policy>> + Send;

    fn delete_policy(&self, policy_id: &str) -> impl Future<Output = ApiResult<()>> + Send;

    fn activate_policy(&self, policy_id: &str) -> impl Future<Output = ApiResult<()>> + Send;

    fn deactivate_policy(&self, policy_id: &str) -> impl Future<Output = ApiResult<()>> + Send;

    // Policy rules

    fn list_policy_rules(
        &self,
        policy_id: &str,
    ) -> impl Future<Output = ApiResult<Vec<PolicyRule>>> + Send;

    fn create_policy_rule(
        &self,
        policy_id: &str,
        rule: &PolicyRule,
    ) -> impl Future<Output = ApiResult<PolicyRule>> + Send;

    fn update_policy_rule(
        &self,
        policy_id: &str,
        rule_id: &str,
        rule: &PolicyRule,
    ) -> impl Future<Output = ApiResult<PolicyRule>> + Send;

    fn delete_policy_rule(
        &self,
        policy_id: &str,
        rule_id: &str,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    fn activate_policy_rule(
        &self,
        policy_id: &str,
        rule_id: &str,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    fn deactivate_policy_rule(
        &self,
        policy_id: &str,
        rule_id: &str,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    // Groups

    /// Search groups by name prefix.
    fn list_groups(&self, query: &str) -> impl Future<Output = ApiResult<Vec<Group>>> + Send;

    fn list_group_users(
        &self,
        group_id: &str,
    ) -> impl Future<Output = ApiResult<Vec<User>>> + Send;

    /// Groups the user belongs to.
    fn list_user_groups(
        &self,
        user_id: &str,
    ) -> impl Future<Output = ApiResult<Vec<Group>>> + Send;

    fn add_user_to_group(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    fn remove_user_from_group(
        &self,
        group_id: &str,
        user_id: &str,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    // Users

    /// Users whose `profile.email` equals the given address.
    fn list_users_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = ApiResult<Vec<User>>> + Send;

    fn get_user(&self, user_id: &str) -> impl Future<Output = ApiResult<Option<User>>> + Send;

    fn create_user(
        &self,
        user: &User,
        activate: bool,
    ) -> impl Future<Output = ApiResult<User>> + Send;

    fn update_user(
        &self,
        user_id: &str,
        user: &User,
    ) -> impl Future<Output = ApiResult<User>> + Send;

    fn deactivate_user(&self, user_id: &str) -> impl Future<Output = ApiResult<()>> + Send;

    /// Delete a user. Only `DEPROVISIONED` users are deleted outright.
    fn delete_user(&self, user_id: &str) -> impl Future<Output = ApiResult<()>> + Send;

    fn list_roles(&self, user_id: &str) -> impl Future<Output = ApiResult<Vec<Role>>> + Send;

    fn assign_role(
        &self,
        user_id: &str,
        role_type: &str,
    ) -> impl Future<Output = ApiResult<Role>> + Send;

    fn unassign_role(
        &self,
        user_id: &str,
        role_id: &str,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    // User schema

    fn get_user_schema(&self) -> impl Future<Output = ApiResult<UserSchema>> + Send;

    /// Post a partial schema. Properties mapped to `None` are removed.
    fn update_user_schema(
        &self,
        schema: &UserSchema,
    ) -> impl Future<Output = ApiResult<UserSchema>> + Send;

    // Profile mappings

    fn list_mappings_by_source(
        &self,
        source_id: &str,
    ) -> impl Future<Output = ApiResult<Vec<ProfileMapping>>> + Send;

    fn get_mapping(
        &self,
        mapping_id: &str,
    ) -> impl Future<Output = ApiResult<Option<ProfileMapping>>> + Send;

    /// Post a partial mapping. Properties mapped to `None` are removed.
    fn update_mapping(
        &self,
        mapping_id: &str,
        mapping: &ProfileMapping,
    ) -> impl Future<Output = ApiResult<ProfileMapping>> + Send;
}
