//! `okta_policies` data source.

use crate::client::OktaApi;
use crate::error::{ProviderError, ProviderResult, ValidationError};
use crate::models::PolicyType;
use crate::resource::{DataSourceHandler, ResourceData};
use crate::resources::policy::find_policy;
use crate::schema::{AttributeSchema, ResourceSchema};
use async_trait::async_trait;
use log::info;

pub const DATA_SOURCE_NAME: &str = "okta_policies";

/// Resolves a policy ID from its name and type.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyDataSource;

#[async_trait]
impl<C: OktaApi> DataSourceHandler<C> for PolicyDataSource {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(DATA_SOURCE_NAME, "Look up a policy ID by name")
            .attribute(AttributeSchema::string("name").required().description("Policy name"))
            .attribute(
                AttributeSchema::string("type")
                    .required()
                    .one_of(&PolicyType::ALL)
                    .description("Policy type: OKTA_SIGN_ON, PASSWORD, MFA_ENROLL, or OAUTH_AUTHORIZATION_POLICY"),
            )
    }

    async fn read(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        let name = d.get_string("name");
        info!("Data Source Policy Read {}", name);

        let policy_type: PolicyType = d
            .get_string("type")
            .parse()
            .map_err(|e: String| ProviderError::from(ValidationError::custom(e)))?;
        let policy = find_policy(client, policy_type, &name)
            .await?
            .ok_or_else(|| ProviderError::not_found(format!("{} Policy", policy_type), &name))?;
        let id = policy
            .id
            .ok_or_else(|| ProviderError::internal("remote policy has no id"))?;
        d.set_id(id);
        Ok(())
    }
}
