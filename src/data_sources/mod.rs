//! Read-only lookups that resolve Okta object IDs by name.
//!
//! | Type name        | Inputs         | Resolves   |
//! |------------------|----------------|------------|
//! | `okta_policies`  | `name`, `type` | policy ID  |
//! | `okta_groups`    | `name`         | group ID   |

pub mod group;
pub mod policy;

pub use group::GroupDataSource;
pub use policy::PolicyDataSource;

use crate::client::OktaApi;
use crate::provider::Provider;

/// Register every built-in data source.
pub fn register_all<C: OktaApi>(provider: &mut Provider<C>) {
    provider.register_data_source(PolicyDataSource);
    provider.register_data_source(GroupDataSource);
}
