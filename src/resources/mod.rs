//! Resource handlers for Okta objects.
//!
//! | Type name                 | Remote object                         |
//! |---------------------------|---------------------------------------|
//! | `okta_policies`           | sign-on and password policies         |
//! | `okta_policy_rules`       | rules inside those policies           |
//! | `okta_users`              | users and their administrator role    |
//! | `okta_group_memberships`  | a user's membership in a group        |
//! | `okta_user_schemas`       | custom user profile properties        |
//! | `okta_profile_mappings`   | expressions of a profile mapping      |
//!
//! Okta assigns opaque IDs, so most handlers resolve the declared object by
//! listing candidates and matching on name before every operation.

pub mod group_membership;
pub mod policy;
pub mod policy_rule;
pub mod profile_mapping;
pub mod user;
pub mod user_schema;

pub use group_membership::GroupMembershipResource;
pub use policy::PolicyResource;
pub use policy_rule::PolicyRuleResource;
pub use profile_mapping::ProfileMappingResource;
pub use user::UserResource;
pub use user_schema::UserSchemaResource;

use crate::client::OktaApi;
use crate::error::{ApiError, ProviderError, ProviderResult};
use crate::models::Status;
use crate::provider::Provider;
use crate::resource::ResourceData;
use log::debug;

/// Register every built-in resource type.
pub fn register_all<C: OktaApi>(provider: &mut Provider<C>) {
    provider.register_resource(PolicyResource);
    provider.register_resource(PolicyRuleResource);
    provider.register_resource(UserResource);
    provider.register_resource(GroupMembershipResource);
    provider.register_resource(UserSchemaResource);
    provider.register_resource(ProfileMappingResource);
}

/// Map a remote failure to a provider error naming the operation.
pub(crate) fn api_err(operation: &'static str) -> impl FnOnce(ApiError) -> ProviderError {
    move |source| ProviderError::api(operation, source)
}

/// Declared `status`, `ACTIVE` when unset.
pub(crate) fn declared_status(d: &ResourceData) -> ProviderResult<Status> {
    match d.get_str("status") {
        None => Ok(Status::Active),
        Some(raw) => raw
            .parse()
            .map_err(|e: String| ProviderError::internal(e)),
    }
}

/// Which lifecycle call, if any, moves a remote object to the declared status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StatusChange {
    Activate,
    Deactivate,
}

pub(crate) fn status_change(remote: Option<Status>, declared: Status) -> Option<StatusChange> {
    // Okta reports no status only for objects it has just made active.
    let remote = remote.unwrap_or(Status::Active);
    if remote == declared {
        debug!("status already {}", declared);
        return None;
    }
    Some(match declared {
        Status::Active => StatusChange::Activate,
        Status::Inactive => StatusChange::Deactivate,
    })
}
