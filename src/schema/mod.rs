//! Attribute schemas and configuration validation.
//!
//! Every resource and data source declares a [`ResourceSchema`]. The provider
//! validates declared configuration against it and fills defaults before the
//! resource's own cross-field checks run.
//!
//! # Example Usage
//!
//! ```rust
//! use okta_provider::schema::{AttributeSchema, ResourceSchema};
//! use serde_json::json;
//!
//! let schema = ResourceSchema::new("okta_groups", "Look up a group by name")
//!     .attribute(AttributeSchema::string("name").required())
//!     .attribute(AttributeSchema::string("id").computed());
//!
//! assert!(schema.validate(&json!({ "name": "Engineering" })).is_ok());
//! assert!(schema.validate(&json!({})).is_err());
//! ```

pub mod types;
pub mod validation;

pub use types::{AttributeSchema, AttributeType, ResourceSchema};
