//! Resource and data source type registration.

use super::core::Provider;
use crate::client::OktaApi;
use crate::error::{ProviderError, ProviderResult};
use crate::resource::{DataSourceHandler, ResourceHandler, ResourceOperation};
use crate::schema::ResourceSchema;
use log::debug;
use std::sync::Arc;

impl<C: OktaApi> Provider<C> {
    /// Register a resource handler under its schema name.
    pub fn register_resource<H>(&mut self, handler: H)
    where
        H: ResourceHandler<C> + 'static,
    {
        let name = handler.schema().name;
        debug!("Registering resource type {}", name);
        self.resources.insert(name, Arc::new(handler));
    }

    /// Register a data source handler under its schema name.
    pub fn register_data_source<H>(&mut self, handler: H)
    where
        H: DataSourceHandler<C> + 'static,
    {
        let name = handler.schema().name;
        debug!("Registering data source {}", name);
        self.data_sources.insert(name, Arc::new(handler));
    }

    /// Registered resource type names, sorted.
    pub fn resource_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.resources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered data source names, sorted.
    pub fn data_source_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.data_sources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Schema of a registered resource type.
    pub fn resource_schema(&self, resource_type: &str) -> ProviderResult<ResourceSchema> {
        Ok(self.get_handler(resource_type)?.schema())
    }

    /// Operations a registered resource type supports.
    pub fn supported_operations(&self, resource_type: &str) -> ProviderResult<Vec<ResourceOperation>> {
        Ok(self.get_handler(resource_type)?.operations())
    }

    pub(super) fn get_handler(
        &self,
        resource_type: &str,
    ) -> ProviderResult<Arc<dyn ResourceHandler<C>>> {
        self.resources
            .get(resource_type)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownResourceType(resource_type.to_string()))
    }

    pub(super) fn get_data_source(
        &self,
        data_source_type: &str,
    ) -> ProviderResult<Arc<dyn DataSourceHandler<C>>> {
        self.data_sources
            .get(data_source_type)
            .cloned()
            .ok_or_else(|| ProviderError::UnknownResourceType(data_source_type.to_string()))
    }

    /// Fail unless the handler implements the operation.
    pub(super) fn ensure_operation_supported(
        &self,
        handler: &dyn ResourceHandler<C>,
        operation: ResourceOperation,
    ) -> ProviderResult<()> {
        if handler.operations().contains(&operation) {
            Ok(())
        } else {
            Err(ProviderError::unsupported(format!(
                "{} does not support {:?}",
                handler.schema().name,
                operation
            )))
        }
    }
}
