//! `okta_users`: users and their single administrator role.
//!
//! A user is matched by email address. Creating a user whose email already
//! exists adopts the remote user; finding more than one is an error. The
//! instance ID is the remote user ID.

use super::api_err;
use crate::client::OktaApi;
use crate::error::{ProviderError, ProviderResult};
use crate::models::user::DEPROVISIONED;
use crate::models::{ADMIN_ROLE_TYPES, User, UserProfile};
use crate::resource::{ResourceData, ResourceHandler, ResourceOperation};
use crate::schema::{AttributeSchema, ResourceSchema};
use async_trait::async_trait;
use log::{info, warn};
use serde_json::Value;

pub const RESOURCE_NAME: &str = "okta_users";

/// Handler for `okta_users`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserResource;

fn user_schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_NAME, "Okta users")
        .attribute(AttributeSchema::string("firstname").required().description("User first name"))
        .attribute(AttributeSchema::string("lastname").required().description("User last name"))
        .attribute(AttributeSchema::string("email").required().description("User email address"))
        .attribute(
            AttributeSchema::string("login")
                .optional_computed()
                .description("User Okta login. Defaults to the email address"),
        )
        .attribute(
            AttributeSchema::string("role")
                .one_of(&ADMIN_ROLE_TYPES)
                .description("User Okta administrator role"),
        )
}

fn declared_profile(d: &ResourceData) -> UserProfile {
    let email = d.get_string("email");
    UserProfile {
        first_name: d.get_string("firstname"),
        last_name: d.get_string("lastname"),
        login: d
            .get_str("login")
            .filter(|login| !login.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| email.clone()),
        email,
    }
}

fn record_profile(d: &mut ResourceData, profile: &UserProfile) {
    d.set("firstname", profile.first_name.as_str());
    d.set("lastname", profile.last_name.as_str());
    d.set("email", profile.email.as_str());
    d.set("login", profile.login.as_str());
}

fn user_id(d: &ResourceData) -> ProviderResult<String> {
    d.id()
        .map(str::to_string)
        .ok_or_else(|| ProviderError::internal("user instance has no id"))
}

async fn get_user<C: OktaApi>(client: &C, user_id: &str) -> ProviderResult<Option<User>> {
    client
        .get_user(user_id)
        .await
        .map_err(api_err("GetByID"))
}

/// The user's role type, if any. More than one assigned role is an error.
async fn current_role<C: OktaApi>(client: &C, user_id: &str) -> ProviderResult<Option<String>> {
    let roles = client
        .list_roles(user_id)
        .await
        .map_err(api_err("listing user role"))?;
    if roles.len() > 1 {
        return Err(ProviderError::cardinality(
            "User has more than one role. This provider presently only supports a single role per user. Please review the user's role assignments in Okta.",
        ));
    }
    Ok(roles.into_iter().next().map(|role| role.role_type))
}

#[async_trait]
impl<C: OktaApi> ResourceHandler<C> for UserResource {
    fn schema(&self) -> ResourceSchema {
        user_schema()
    }

    fn operations(&self) -> Vec<ResourceOperation> {
        vec![
            ResourceOperation::Create,
            ResourceOperation::Read,
            ResourceOperation::Update,
            ResourceOperation::Delete,
            ResourceOperation::Import,
        ]
    }

    async fn exists(&self, client: &C, d: &ResourceData) -> ProviderResult<bool> {
        Ok(get_user(client, &user_id(d)?).await?.is_some())
    }

    async fn create(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        let email = d.get_string("email");
        info!("Creating User {}", email);

        let mut matches = client
            .list_users_by_email(&email)
            .await
            .map_err(api_err("listing users by email"))?;
        if matches.len() > 1 {
            return Err(ProviderError::cardinality(format!(
                "Retrieved more than one Okta user for the email {}",
                email
            )));
        }
        if let Some(existing) = matches.pop() {
            info!("User {} already exists in Okta. Adding to state.", email);
            let id = existing
                .id
                .ok_or_else(|| ProviderError::internal("remote user has no id"))?;
            d.set_id(id);
            d.set("login", existing.profile.login);
            return Ok(());
        }

        let profile = declared_profile(d);
        let created = client
            .create_user(&User::new(profile.clone()), true)
            .await
            .map_err(api_err("Creating User"))?;
        let id = created
            .id
            .ok_or_else(|| ProviderError::internal("created user has no id"))?;
        info!("Okta User Created: {}", id);
        d.set_id(id.as_str());
        d.set("login", profile.login);

        if let Some(role) = d.get_str("role").map(str::to_string) {
            info!("Assigning role: {}", role);
            client
                .assign_role(&id, &role)
                .await
                .map_err(api_err("assigning role to user"))?;
        }
        Ok(())
    }

    async fn read(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        info!("List User {}", d.get_string("email"));
        let id = user_id(d)?;

        let Some(user) = get_user(client, &id).await? else {
            warn!("User {} not found in Okta, removing from state", id);
            d.clear_id();
            return Ok(());
        };
        record_profile(d, &user.profile);
        let role = current_role(client, &id).await?;
        d.set("role", role.map_or(Value::Null, Value::from));
        Ok(())
    }

    async fn update(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        info!("Update User {}", d.get_string("email"));
        d.partial(true);
        let id = user_id(d)?;

        if get_user(client, &id).await?.is_none() {
            return Err(ProviderError::not_found("User", id));
        }

        let profile = declared_profile(d);
        client
            .update_user(&id, &User::new(profile.clone()))
            .await
            .map_err(api_err("Updating User"))?;
        info!("Okta User Updated: {}", id);
        d.set("login", profile.login);

        if d.has_change("role") {
            let roles = client
                .list_roles(&id)
                .await
                .map_err(api_err("listing user role"))?;
            for role in roles {
                info!("Removing role: {}", role.role_type);
                client
                    .unassign_role(&id, &role.id)
                    .await
                    .map_err(api_err("removing role from user"))?;
            }
            if let Some(role) = d.get_str("role").map(str::to_string) {
                info!("Assigning role: {}", role);
                client
                    .assign_role(&id, &role)
                    .await
                    .map_err(api_err("assigning role to user"))?;
            }
        }

        d.partial(false);
        Ok(())
    }

    async fn delete(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        info!("Delete User {}", d.get_string("email"));
        let id = user_id(d)?;

        let user = get_user(client, &id)
            .await?
            .ok_or_else(|| ProviderError::not_found("User", id.as_str()))?;
        if user.status.as_deref() != Some(DEPROVISIONED) {
            client
                .deactivate_user(&id)
                .await
                .map_err(api_err("Deactivating user"))?;
        }
        client
            .delete_user(&id)
            .await
            .map_err(api_err("Deleting user"))?;
        d.clear_id();
        Ok(())
    }

    /// Import by user ID; the read that follows fills in the profile.
    async fn import(&self, _client: &C, id: &str) -> ProviderResult<ResourceData> {
        Ok(ResourceData::for_import(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_defaults_to_email() {
        let d = ResourceData::new(
            json!({ "firstname": "Ada", "lastname": "Lovelace", "email": "ada@example.com" }),
            None,
        );
        let profile = declared_profile(&d);
        assert_eq!(profile.login, "ada@example.com");
        assert_eq!(profile.first_name, "Ada");

        let d = ResourceData::new(
            json!({
                "firstname": "Ada",
                "lastname": "Lovelace",
                "email": "ada@example.com",
                "login": "ada"
            }),
            None,
        );
        assert_eq!(declared_profile(&d).login, "ada");
    }

    #[test]
    fn test_role_values() {
        let schema = user_schema();
        let config = json!({
            "firstname": "Ada",
            "lastname": "Lovelace",
            "email": "ada@example.com",
            "role": "SUPER_ADMIN"
        });
        assert!(schema.validate(&config).is_ok());

        let config = json!({
            "firstname": "Ada",
            "lastname": "Lovelace",
            "email": "ada@example.com",
            "role": "OWNER"
        });
        assert!(schema.validate(&config).is_err());
    }
}
