//! Handler traits implemented by each resource and data source type.

use super::data::{ResourceData, ResourceDiff};
use crate::client::OktaApi;
use crate::error::{ProviderError, ProviderResult, ValidationResult};
use crate::schema::ResourceSchema;
use async_trait::async_trait;

/// Lifecycle operations a resource handler may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceOperation {
    Create,
    Read,
    Update,
    Delete,
    Import,
}

/// Create/read/update/delete for one resource type.
///
/// Handlers are stateless: the client handle and the instance data are passed
/// into every call. A handler that leaves the instance ID cleared after
/// `read` signals that the remote object is gone.
#[async_trait]
pub trait ResourceHandler<C: OktaApi>: Send + Sync {
    /// Attribute schema of this resource type.
    fn schema(&self) -> ResourceSchema;

    /// Operations this handler implements.
    fn operations(&self) -> Vec<ResourceOperation> {
        vec![
            ResourceOperation::Create,
            ResourceOperation::Read,
            ResourceOperation::Update,
            ResourceOperation::Delete,
        ]
    }

    /// Cross-field validation at plan time, before any remote call.
    fn customize_diff(&self, _diff: &ResourceDiff) -> ValidationResult<()> {
        Ok(())
    }

    /// Whether the remote object behind the instance still exists.
    async fn exists(&self, client: &C, d: &ResourceData) -> ProviderResult<bool>;

    async fn create(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()>;

    async fn read(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()>;

    async fn update(&self, _client: &C, _d: &mut ResourceData) -> ProviderResult<()> {
        Err(ProviderError::unsupported(format!(
            "{} does not support in-place updates",
            self.schema().name
        )))
    }

    async fn delete(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()>;

    /// Build instance data from an import identifier; the provider reads it
    /// afterwards.
    async fn import(&self, _client: &C, _id: &str) -> ProviderResult<ResourceData> {
        Err(ProviderError::unsupported(format!(
            "{} does not support import",
            self.schema().name
        )))
    }
}

/// Read-only lookup.
#[async_trait]
pub trait DataSourceHandler<C: OktaApi>: Send + Sync {
    fn schema(&self) -> ResourceSchema;

    async fn read(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()>;
}
