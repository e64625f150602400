//! The provider: resource registry and plan/apply driver.
//!
//! # Module Organization
//!
//! * [`core`] - the [`Provider`] struct and constructors
//! * [`builder`] - [`ProviderBuilder`] for real Okta organizations
//! * [`registration`] - registering and looking up handlers
//! * [`operations`] - plan, apply, refresh, destroy, import and data source reads

pub mod builder;
pub mod core;
pub mod operations;
pub mod registration;

pub use builder::ProviderBuilder;
pub use core::Provider;
pub use operations::{ApplyError, Plan, PlanAction};
