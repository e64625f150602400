//! `okta_groups` data source.

use crate::client::OktaApi;
use crate::error::{ProviderError, ProviderResult};
use crate::resource::{DataSourceHandler, ResourceData};
use crate::resources::api_err;
use crate::schema::{AttributeSchema, ResourceSchema};
use async_trait::async_trait;
use log::info;

pub const DATA_SOURCE_NAME: &str = "okta_groups";

/// Resolves a group ID from a name query. The query must match exactly one
/// group.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupDataSource;

#[async_trait]
impl<C: OktaApi> DataSourceHandler<C> for GroupDataSource {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(DATA_SOURCE_NAME, "Look up a group ID by name")
            .attribute(AttributeSchema::string("name").required().description("Group name"))
    }

    async fn read(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        let name = d.get_string("name");
        info!("Data Source Group Read {}", name);

        let mut groups = client
            .list_groups(&name)
            .await
            .map_err(api_err("ListGroups query"))?;
        if groups.len() > 1 {
            return Err(ProviderError::cardinality(
                "Group query resulted in more than one group.",
            ));
        }
        let group = groups
            .pop()
            .ok_or_else(|| ProviderError::cardinality("Group query resulted in no groups."))?;
        d.set_id(group.id);
        Ok(())
    }
}
