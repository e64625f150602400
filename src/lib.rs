//! Declarative Okta resources for Rust.
//!
//! Exposes Okta policies, policy rules, users, group memberships, user schema
//! properties and profile mappings as declarative resources. Each resource
//! type has an attribute schema and create/read/update/delete handlers that
//! reconcile declared configuration with the remote organization, matching
//! existing objects by name so repeated applies converge.
//!
//! # Core Components
//!
//! - [`Provider`] - Resource registry and plan/apply driver
//! - [`OktaApi`] - Every remote call the handlers issue
//! - [`ResourceHandler`] - Trait implemented by each resource type
//! - [`ResourceSchema`] - Attribute declarations and validation
//!
//! # Quick Start
//!
//! ```rust
//! use okta_provider::Provider;
//! use okta_provider::client::InMemoryOkta;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Provider::with_builtin_resources(InMemoryOkta::with_defaults().await);
//!
//! let state = provider
//!     .plan_and_apply(
//!         "okta_policies",
//!         json!({ "type": "PASSWORD", "name": "contractors", "status": "INACTIVE" }),
//!         None,
//!     )
//!     .await?;
//! assert!(state.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! Against a real organization, build the provider from [`Config`]:
//!
//! ```rust,no_run
//! use okta_provider::{Config, ProviderBuilder};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = ProviderBuilder::from_config(Config::from_env()?).build()?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod data_sources;
pub mod error;
pub mod models;
pub mod provider;
pub mod resource;
pub mod resources;
pub mod schema;

// Re-export commonly used types for convenience
pub use client::{HttpOktaClient, InMemoryOkta, OktaApi};
pub use config::Config;
pub use error::{
    ApiError, ApiResult, ProviderError, ProviderResult, ValidationError, ValidationResult,
};
pub use provider::{ApplyError, Plan, PlanAction, Provider, ProviderBuilder};
pub use resource::{
    DataSourceHandler, InstanceState, ResourceData, ResourceHandler, ResourceOperation,
};
pub use schema::{AttributeSchema, AttributeType, ResourceSchema};
