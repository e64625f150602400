//! Builder for providers talking to a real Okta organization.

use crate::client::HttpOktaClient;
use crate::config::Config;
use crate::error::ProviderResult;
use crate::provider::Provider;
use log::info;
use std::time::Duration;

/// Builder for a [`Provider`] backed by [`HttpOktaClient`].
///
/// # Examples
///
/// ```rust
/// use okta_provider::provider::ProviderBuilder;
///
/// let provider = ProviderBuilder::new()
///     .org_name("dev-123456")
///     .api_token("00abc")
///     .build()
///     .unwrap();
/// assert!(provider.resource_types().contains(&"okta_users"));
///
/// assert!(ProviderBuilder::new().org_name("dev-123456").build().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ProviderBuilder {
    config: Config,
    builtin_resources: bool,
}

impl ProviderBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::new("", ""),
            builtin_resources: true,
        }
    }

    /// Start from an existing configuration, e.g. [`Config::from_env`].
    pub fn from_config(config: Config) -> Self {
        Self {
            config,
            builtin_resources: true,
        }
    }

    pub fn org_name(mut self, org_name: impl Into<String>) -> Self {
        self.config.org_name = org_name.into();
        self
    }

    /// Domain the organization lives under. Defaults to `okta.com`.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    pub fn api_token(mut self, api_token: impl Into<String>) -> Self {
        self.config.api_token = api_token.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Skip registering the built-in resources and data sources.
    pub fn without_builtin_resources(mut self) -> Self {
        self.builtin_resources = false;
        self
    }

    /// Validate the configuration and build the provider.
    pub fn build(self) -> ProviderResult<Provider<HttpOktaClient>> {
        let client = HttpOktaClient::new(&self.config)?;
        info!(
            "Configured Okta provider for {}.{}",
            self.config.org_name, self.config.base_url
        );
        Ok(if self.builtin_resources {
            Provider::with_builtin_resources(client)
        } else {
            Provider::new(client)
        })
    }
}

impl Default for ProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_BASE_URL;

    #[test]
    fn test_builder_defaults_base_url() {
        let builder = ProviderBuilder::new().org_name("acme").api_token("t");
        assert_eq!(builder.config.base_url, DEFAULT_BASE_URL);
        let provider = builder.build().unwrap();
        assert_eq!(
            provider.client().api_root().as_str(),
            "https://acme.okta.com/api/v1/"
        );
    }

    #[test]
    fn test_builder_without_builtins() {
        let provider = ProviderBuilder::new()
            .org_name("acme")
            .base_url("oktapreview.com")
            .api_token("t")
            .without_builtin_resources()
            .build()
            .unwrap();
        assert!(provider.resource_types().is_empty());
    }

    #[test]
    fn test_builder_requires_token() {
        assert!(ProviderBuilder::new().org_name("acme").build().is_err());
    }
}
