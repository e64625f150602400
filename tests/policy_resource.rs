//! Policy lifecycle against an in-memory organization.

mod common;

use common::{apply, mutating_operations, provider};
use okta_provider::models::{PolicyType, Status};
use okta_provider::{PlanAction, ProviderError, ValidationError};
use serde_json::json;

#[tokio::test]
async fn test_create_then_unchanged_apply_is_noop() {
    let (provider, okta) = provider().await;
    let config = json!({
        "type": "PASSWORD",
        "name": "contractors",
        "description": "Contractor password policy",
        "settings": { "password": { "minlength": 12 } }
    });

    let state = apply(&provider, "okta_policies", config.clone(), None).await;
    let created = okta
        .find_policy(PolicyType::Password, "contractors")
        .await
        .expect("policy should exist");
    assert_eq!(Some(state.id.as_str()), created.id.as_deref());
    assert_eq!(state.attributes["system"], json!(false));
    let complexity = created.settings.unwrap().password.unwrap().complexity;
    assert_eq!(complexity.min_length, 12);
    assert_eq!(complexity.min_lower_case, 1);

    okta.clear_calls().await;
    let plan = provider
        .plan("okta_policies", config.clone(), Some(&state))
        .unwrap();
    assert_eq!(plan.action, PlanAction::NoOp);
    let again = provider.apply(plan).await.unwrap().unwrap();
    assert_eq!(again.id, state.id);
    assert!(okta.mutating_calls().await.is_empty());
}

#[tokio::test]
async fn test_deactivate_only_changes_status() {
    let (provider, okta) = provider().await;
    let config = json!({ "type": "PASSWORD", "name": "p1", "status": "ACTIVE" });
    let state = apply(&provider, "okta_policies", config, None).await;

    okta.clear_calls().await;
    let inactive = json!({ "type": "PASSWORD", "name": "p1", "status": "INACTIVE" });
    let state = apply(&provider, "okta_policies", inactive, Some(&state)).await;

    assert_eq!(okta.call_count("deactivate_policy").await, 1);
    assert_eq!(okta.call_count("create_policy").await, 0);
    assert_eq!(okta.call_count("activate_policy").await, 0);
    let remote = okta.find_policy(PolicyType::Password, "p1").await.unwrap();
    assert_eq!(remote.status, Some(Status::Inactive));
    assert_eq!(remote.id.as_deref(), Some(state.id.as_str()));
}

#[tokio::test]
async fn test_rename_rejected_before_remote_calls() {
    let (provider, okta) = provider().await;
    let state = apply(
        &provider,
        "okta_policies",
        json!({ "type": "PASSWORD", "name": "p1" }),
        None,
    )
    .await;

    okta.clear_calls().await;
    let error = provider
        .plan(
            "okta_policies",
            json!({ "type": "PASSWORD", "name": "p2" }),
            Some(&state),
        )
        .unwrap_err();
    assert!(matches!(
        error,
        ProviderError::Validation(ValidationError::ImmutablePolicyIdentity)
    ));
    assert!(okta.calls().await.is_empty());
}

#[tokio::test]
async fn test_sign_on_policy_rejects_password_options() {
    let (provider, _okta) = provider().await;

    let error = provider
        .plan(
            "okta_policies",
            json!({
                "type": "OKTA_SIGN_ON",
                "name": "s1",
                "settings": { "password": { "minlength": 10 } }
            }),
            None,
        )
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "password settings options not supported in the Okta SignOn Policy"
    );

    let error = provider
        .plan(
            "okta_policies",
            json!({
                "type": "OKTA_SIGN_ON",
                "name": "s1",
                "conditions": { "authprovider": { "provider": "OKTA" } }
            }),
            None,
        )
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "authprovider condition options not supported in the Okta SignOn Policy"
    );
}

#[tokio::test]
async fn test_unsupported_policy_types() {
    let (provider, okta) = provider().await;
    let error = provider
        .plan_and_apply(
            "okta_policies",
            json!({ "type": "MFA_ENROLL", "name": "m1" }),
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "MFA Policy not supported in this provider at this time"
    );
    assert!(error.state.is_none());
    assert!(mutating_operations(&okta).await.is_empty());
}

#[tokio::test]
async fn test_system_policy_is_adopted_and_never_deleted() {
    let (provider, okta) = provider().await;
    let config = json!({
        "type": "PASSWORD",
        "name": "Default Policy",
        "status": "INACTIVE",
        "settings": { "password": { "minlength": 14 } }
    });

    let state = apply(&provider, "okta_policies", config, None).await;
    assert_eq!(state.attributes["system"], json!(true));
    assert_eq!(okta.call_count("create_policy").await, 0);
    assert_eq!(okta.call_count("update_policy").await, 1);
    assert_eq!(okta.call_count("deactivate_policy").await, 0);

    let remote = okta
        .find_policy(PolicyType::Password, "Default Policy")
        .await
        .unwrap();
    assert_eq!(remote.status, Some(Status::Active));
    let password = remote.settings.unwrap().password.unwrap();
    assert_eq!(password.complexity.min_length, 14);

    provider.destroy("okta_policies", &state).await.unwrap();
    assert_eq!(okta.call_count("delete_policy").await, 0);
    assert!(
        okta.find_policy(PolicyType::Password, "Default Policy")
            .await
            .is_some()
    );
}

#[tokio::test]
async fn test_existing_policy_is_adopted() {
    let (provider, okta) = provider().await;
    let first = apply(
        &provider,
        "okta_policies",
        json!({ "type": "PASSWORD", "name": "shared" }),
        None,
    )
    .await;

    okta.clear_calls().await;
    let adopted = apply(
        &provider,
        "okta_policies",
        json!({ "type": "PASSWORD", "name": "shared" }),
        None,
    )
    .await;
    assert_eq!(adopted.id, first.id);
    assert!(mutating_operations(&okta).await.is_empty());
}

#[tokio::test]
async fn test_refresh_drops_deleted_policy() {
    let (provider, okta) = provider().await;
    let state = apply(
        &provider,
        "okta_policies",
        json!({ "type": "PASSWORD", "name": "temporary" }),
        None,
    )
    .await;

    provider.destroy("okta_policies", &state).await.unwrap();
    assert_eq!(mutating_operations(&okta).await.last(), Some(&"delete_policy"));
    assert!(provider.refresh("okta_policies", &state).await.unwrap().is_none());
}

#[tokio::test]
async fn test_import_by_id() {
    let (provider, okta) = provider().await;
    let remote = okta
        .find_policy(PolicyType::OktaSignOn, "Default Policy")
        .await
        .unwrap();
    let id = remote.id.unwrap();

    let state = provider.import("okta_policies", &id).await.unwrap();
    assert_eq!(state.id, id);
    assert_eq!(state.attributes["type"], json!("OKTA_SIGN_ON"));
    assert_eq!(state.attributes["name"], json!("Default Policy"));
    assert_eq!(state.attributes["system"], json!(true));
}

#[tokio::test]
async fn test_retype_rejected_before_remote_calls() {
    let (provider, okta) = provider().await;
    let state = apply(
        &provider,
        "okta_policies",
        json!({ "type": "PASSWORD", "name": "p1" }),
        None,
    )
    .await;

    okta.clear_calls().await;
    let error = provider
        .plan(
            "okta_policies",
            json!({ "type": "OKTA_SIGN_ON", "name": "p1" }),
            Some(&state),
        )
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "You cannot change the name field or type field of an existing Policy"
    );
    assert!(okta.calls().await.is_empty());
}
