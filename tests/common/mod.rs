//! Shared helpers for the integration tests.
//!
//! Every test drives a [`Provider`] over an [`InMemoryOkta`] seeded like a
//! fresh organization, and asserts on the remote calls it recorded.

#![allow(dead_code)]

use okta_provider::models::UserProfile;
use okta_provider::{InMemoryOkta, InstanceState, Provider};
use serde_json::Value;

/// Provider with every built-in type, plus a handle on its tenant.
pub async fn provider() -> (Provider<InMemoryOkta>, InMemoryOkta) {
    let _ = env_logger::builder().is_test(true).try_init();
    let okta = InMemoryOkta::with_defaults().await;
    (Provider::with_builtin_resources(okta.clone()), okta)
}

/// Plan and apply, expecting a recorded instance.
pub async fn apply(
    provider: &Provider<InMemoryOkta>,
    resource_type: &str,
    config: Value,
    prior: Option<&InstanceState>,
) -> InstanceState {
    provider
        .plan_and_apply(resource_type, config, prior)
        .await
        .expect("apply should succeed")
        .expect("instance should be recorded")
}

/// Operation names of the mutating calls recorded so far.
pub async fn mutating_operations(okta: &InMemoryOkta) -> Vec<&'static str> {
    okta.mutating_calls()
        .await
        .into_iter()
        .map(|call| call.operation)
        .collect()
}

pub fn profile(first: &str, last: &str, email: &str) -> UserProfile {
    UserProfile {
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: email.to_string(),
        login: email.to_string(),
    }
}
