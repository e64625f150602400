//! Provider credentials and endpoint configuration.
//!
//! An Okta organization is addressed as `https://<org_name>.<base_url>/`, where
//! `base_url` is `okta.com` for production orgs and `oktapreview.com` for
//! preview orgs. Requests authenticate with a static API token.

use crate::error::{ProviderError, ProviderResult};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Default base domain for Okta organizations.
pub const DEFAULT_BASE_URL: &str = "okta.com";

pub const ENV_ORG_NAME: &str = "OKTA_ORG_NAME";
pub const ENV_BASE_URL: &str = "OKTA_BASE_URL";
pub const ENV_API_TOKEN: &str = "OKTA_API_TOKEN";

/// Connection settings for one Okta organization.
#[derive(Clone)]
pub struct Config {
    /// Organization subdomain, e.g. `dev-123456`
    pub org_name: String,
    /// Domain the organization lives under
    pub base_url: String,
    /// API token sent as `SSWS <token>`
    pub api_token: String,
    /// Per-request timeout
    pub request_timeout: Duration,
}

// Keep the token out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("org_name", &self.org_name)
            .field("base_url", &self.base_url)
            .field("api_token", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Config {
    /// Create a configuration for the given organization on `okta.com`.
    pub fn new(org_name: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            org_name: org_name.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: api_token.into(),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Override the base domain.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Read `OKTA_ORG_NAME`, `OKTA_BASE_URL` and `OKTA_API_TOKEN`.
    ///
    /// A missing base URL falls back to `okta.com`. The result is validated.
    pub fn from_env() -> ProviderResult<Self> {
        let org_name = std::env::var(ENV_ORG_NAME).unwrap_or_default();
        let api_token = std::env::var(ENV_API_TOKEN).unwrap_or_default();
        let mut config = Self::new(org_name, api_token);
        if let Ok(base_url) = std::env::var(ENV_BASE_URL) {
            if !base_url.trim().is_empty() {
                config.base_url = base_url;
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject empty credentials.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.org_name.trim().is_empty() {
            return Err(ProviderError::configuration("org_name must not be empty"));
        }
        if self.api_token.trim().is_empty() {
            return Err(ProviderError::configuration("api_token must not be empty"));
        }
        if self.base_url.trim().is_empty() {
            return Err(ProviderError::configuration("base_url must not be empty"));
        }
        Ok(())
    }

    /// Root URL of the organization, with a trailing slash.
    pub fn org_url(&self) -> ProviderResult<Url> {
        let raw = format!("https://{}.{}/", self.org_name, self.base_url);
        Url::parse(&raw)
            .map_err(|e| ProviderError::configuration(format!("invalid org URL '{}': {}", raw, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_okta_com() {
        let config = Config::new("dev-123", "token");
        assert_eq!(config.base_url, "okta.com");
        assert_eq!(
            config.org_url().unwrap().as_str(),
            "https://dev-123.okta.com/"
        );
    }

    #[test]
    fn test_preview_org_url() {
        let config = Config::new("acme", "token").with_base_url("oktapreview.com");
        assert_eq!(
            config.org_url().unwrap().as_str(),
            "https://acme.oktapreview.com/"
        );
    }

    #[test]
    fn test_empty_credentials_rejected() {
        assert!(Config::new("", "token").validate().is_err());
        assert!(Config::new("acme", "  ").validate().is_err());
        assert!(Config::new("acme", "token").validate().is_ok());
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", Config::new("acme", "super-secret"));
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("acme"));
    }
}
