//! Resource model shared by the provider and every resource handler.
//!
//! * [`ResourceData`] - attribute values of one instance during an operation
//! * [`InstanceState`] - what is recorded for an instance after apply
//! * [`ResourceHandler`] / [`DataSourceHandler`] - the per-type operations

pub mod data;
pub mod handlers;

pub use data::{InstanceState, ResourceData, ResourceDiff};
pub use handlers::{DataSourceHandler, ResourceHandler, ResourceOperation};
