//! `okta_group_memberships`: one user's membership in one group.
//!
//! The instance ID is `<group_id>/<user_id>`. Both attributes force
//! replacement, so there is no in-place update.

use super::api_err;
use crate::client::OktaApi;
use crate::error::{ProviderError, ProviderResult, ValidationError};
use crate::resource::{ResourceData, ResourceHandler, ResourceOperation};
use crate::schema::{AttributeSchema, ResourceSchema};
use async_trait::async_trait;
use log::{info, warn};

pub const RESOURCE_NAME: &str = "okta_group_memberships";

/// Handler for `okta_group_memberships`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupMembershipResource;

fn membership_schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_NAME, "Okta group memberships")
        .attribute(
            AttributeSchema::string("group_id")
                .required()
                .force_new()
                .description("Group associated with the user"),
        )
        .attribute(
            AttributeSchema::string("user_id")
                .required()
                .force_new()
                .description("User to add to the group"),
        )
}

pub fn membership_id(group_id: &str, user_id: &str) -> String {
    format!("{}/{}", group_id, user_id)
}

/// Split `<group_id>/<user_id>`.
pub fn parse_membership_id(id: &str) -> ProviderResult<(&str, &str)> {
    match id.split_once('/') {
        Some((group_id, user_id)) if !group_id.is_empty() && !user_id.is_empty() => {
            Ok((group_id, user_id))
        }
        _ => Err(ValidationError::custom(format!(
            "group membership id must be <group_id>/<user_id>, got {}",
            id
        ))
        .into()),
    }
}

/// Whether the user is a member, read from the user's side so the answer
/// does not depend on paging through a large group. A missing user or group
/// means no membership.
async fn is_member<C: OktaApi>(client: &C, group_id: &str, user_id: &str) -> ProviderResult<bool> {
    match client.list_user_groups(user_id).await {
        Ok(groups) => Ok(groups.iter().any(|group| group.id == group_id)),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(ProviderError::api("listing user groups", e)),
    }
}

#[async_trait]
impl<C: OktaApi> ResourceHandler<C> for GroupMembershipResource {
    fn schema(&self) -> ResourceSchema {
        membership_schema()
    }

    fn operations(&self) -> Vec<ResourceOperation> {
        vec![
            ResourceOperation::Create,
            ResourceOperation::Read,
            ResourceOperation::Delete,
            ResourceOperation::Import,
        ]
    }

    async fn exists(&self, client: &C, d: &ResourceData) -> ProviderResult<bool> {
        is_member(client, &d.get_string("group_id"), &d.get_string("user_id")).await
    }

    async fn create(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        let group_id = d.get_string("group_id");
        let user_id = d.get_string("user_id");
        info!("Adding User {} to Group {}", user_id, group_id);

        client
            .add_user_to_group(&group_id, &user_id)
            .await
            .map_err(api_err("adding user to group"))?;
        d.set_id(membership_id(&group_id, &user_id));
        Ok(())
    }

    async fn read(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        let group_id = d.get_string("group_id");
        let user_id = d.get_string("user_id");

        if !is_member(client, &group_id, &user_id).await? {
            warn!(
                "User {} is no longer a member of Group {}, removing from state",
                user_id, group_id
            );
            d.clear_id();
        }
        Ok(())
    }

    async fn delete(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        let group_id = d.get_string("group_id");
        let user_id = d.get_string("user_id");
        info!("Removing User {} from Group {}", user_id, group_id);

        match client.remove_user_from_group(&group_id, &user_id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                warn!("Group {} not found in Okta, nothing to remove", group_id);
            }
            Err(e) => return Err(ProviderError::api("removing user from group", e)),
        }
        d.clear_id();
        Ok(())
    }

    async fn import(&self, _client: &C, id: &str) -> ProviderResult<ResourceData> {
        let (group_id, user_id) = parse_membership_id(id)?;
        let mut d = ResourceData::for_import(id);
        d.set("group_id", group_id);
        d.set("user_id", user_id);
        Ok(d)
    }
}
