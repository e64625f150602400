//! Core provider structure and initialization.

use crate::client::OktaApi;
use crate::resource::{DataSourceHandler, ResourceHandler};
use std::collections::HashMap;
use std::sync::Arc;

/// Okta provider: a client handle plus the registered resource and data
/// source handlers, keyed by type name.
///
/// The provider is generic over the remote API so the same handlers run
/// against a real organization or against
/// [`InMemoryOkta`](crate::client::InMemoryOkta).
///
/// # Examples
///
/// ```rust
/// use okta_provider::Provider;
/// use okta_provider::client::InMemoryOkta;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let okta = InMemoryOkta::with_defaults().await;
/// let provider = Provider::with_builtin_resources(okta);
/// assert!(provider.resource_types().contains(&"okta_policies"));
/// # Ok(())
/// # }
/// ```
pub struct Provider<C: OktaApi> {
    pub(super) client: Arc<C>,
    pub(super) resources: HashMap<String, Arc<dyn ResourceHandler<C>>>,
    pub(super) data_sources: HashMap<String, Arc<dyn DataSourceHandler<C>>>,
}

impl<C: OktaApi> Provider<C> {
    /// Create a provider with no registered types.
    pub fn new(client: C) -> Self {
        Self::from_shared(Arc::new(client))
    }

    /// Create a provider around a shared client handle.
    pub fn from_shared(client: Arc<C>) -> Self {
        Self {
            client,
            resources: HashMap::new(),
            data_sources: HashMap::new(),
        }
    }

    /// Create a provider with every resource and data source this crate
    /// implements.
    pub fn with_builtin_resources(client: C) -> Self {
        let mut provider = Self::new(client);
        crate::resources::register_all(&mut provider);
        crate::data_sources::register_all(&mut provider);
        provider
    }

    /// The client handle every handler call receives.
    pub fn client(&self) -> &C {
        &self.client
    }
}

impl<C: OktaApi> std::fmt::Debug for Provider<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut resources: Vec<_> = self.resources.keys().collect();
        resources.sort();
        let mut data_sources: Vec<_> = self.data_sources.keys().collect();
        data_sources.sort();
        f.debug_struct("Provider")
            .field("resources", &resources)
            .field("data_sources", &data_sources)
            .finish()
    }
}
