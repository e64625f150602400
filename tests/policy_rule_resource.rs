//! Policy rule lifecycle against an in-memory organization.

mod common;

use common::{apply, mutating_operations, provider};
use okta_provider::client::OktaApi;
use okta_provider::models::{PolicyType, Status};
use okta_provider::{InMemoryOkta, Provider, ProviderError, ValidationError};
use serde_json::{Value, json};

async fn sign_on_policy(provider: &Provider<InMemoryOkta>) -> String {
    apply(
        provider,
        "okta_policies",
        json!({ "type": "OKTA_SIGN_ON", "name": "vpn" }),
        None,
    )
    .await
    .id
}

fn rule_config(policy_id: &str) -> Value {
    json!({
        "policyid": policy_id,
        "type": "OKTA_SIGN_ON",
        "name": "office",
        "conditions": { "network": { "include": ["nzo1"] } },
        "actions": { "signon": { "sessionidle": 60 } }
    })
}

#[tokio::test]
async fn test_create_rule_with_defaults() {
    let (provider, okta) = provider().await;
    let policy_id = sign_on_policy(&provider).await;

    let state = apply(&provider, "okta_policy_rules", rule_config(&policy_id), None).await;
    assert_eq!(state.attributes["system"], json!(false));

    let rules = okta.list_policy_rules(&policy_id).await.unwrap();
    let rule = rules.iter().find(|r| r.name == "office").unwrap();
    assert_eq!(rule.id.as_deref(), Some(state.id.as_str()));
    assert_eq!(rule.status, Some(Status::Active));

    let network = rule.conditions.as_ref().unwrap().network.as_ref().unwrap();
    assert_eq!(network.connection, "ZONE");
    assert_eq!(network.include, vec!["nzo1"]);

    let session = &rule.actions.as_ref().unwrap().signon.as_ref().unwrap().session;
    assert_eq!(session.max_session_idle_minutes, 60);
    assert_eq!(session.max_session_lifetime_minutes, 120);
    assert!(!session.use_persistent_cookie);
}

#[tokio::test]
async fn test_deactivate_rule() {
    let (provider, okta) = provider().await;
    let policy_id = sign_on_policy(&provider).await;
    let state = apply(&provider, "okta_policy_rules", rule_config(&policy_id), None).await;

    okta.clear_calls().await;
    let mut config = rule_config(&policy_id);
    config["status"] = json!("INACTIVE");
    apply(&provider, "okta_policy_rules", config, Some(&state)).await;

    assert_eq!(
        mutating_operations(&okta).await,
        vec!["update_policy_rule", "deactivate_policy_rule"]
    );
    let rules = okta.list_policy_rules(&policy_id).await.unwrap();
    let rule = rules.iter().find(|r| r.name == "office").unwrap();
    assert_eq!(rule.status, Some(Status::Inactive));
}

#[tokio::test]
async fn test_default_rule_cannot_be_managed() {
    let (provider, okta) = provider().await;
    let policy = okta
        .find_policy(PolicyType::Password, "Default Policy")
        .await
        .unwrap();

    let error = provider
        .plan(
            "okta_policy_rules",
            json!({
                "policyid": policy.id.unwrap(),
                "type": "PASSWORD",
                "name": "Default Rule"
            }),
            None,
        )
        .unwrap_err();
    assert!(matches!(
        error,
        ProviderError::Validation(ValidationError::DefaultPolicyRule)
    ));
}

#[tokio::test]
async fn test_rule_type_options() {
    let (provider, _okta) = provider().await;

    let error = provider
        .plan(
            "okta_policy_rules",
            json!({
                "policyid": "00p1",
                "type": "PASSWORD",
                "name": "r1",
                "conditions": { "authtype": "RADIUS" }
            }),
            None,
        )
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "authtype condition options not supported in the Okta Password Policy Rule"
    );

    let error = provider
        .plan(
            "okta_policy_rules",
            json!({
                "policyid": "00p1",
                "type": "OKTA_SIGN_ON",
                "name": "r1",
                "actions": { "signon": { "requiremfa": true } }
            }),
            None,
        )
        .unwrap_err();
    assert!(matches!(
        error,
        ProviderError::Validation(ValidationError::UnsupportedMfaActions)
    ));

    let plan = provider
        .plan(
            "okta_policy_rules",
            json!({
                "policyid": "00p1",
                "type": "OKTA_SIGN_ON",
                "name": "r1",
                "actions": { "signon": { "requiremfa": false } }
            }),
            None,
        )
        .unwrap();
    assert_eq!(plan.resource_type, "okta_policy_rules");
}

#[tokio::test]
async fn test_missing_parent_policy() {
    let (provider, okta) = provider().await;
    let error = provider
        .plan_and_apply("okta_policy_rules", rule_config("00pmissing"), None)
        .await
        .unwrap_err();
    assert!(matches!(error.source, ProviderError::MissingPolicy { .. }));
    assert_eq!(error.to_string(), "Cannot find Policy ID 00pmissing in Okta");
    assert!(mutating_operations(&okta).await.is_empty());
}

#[tokio::test]
async fn test_import_and_delete_rule() {
    let (provider, okta) = provider().await;
    let policy_id = sign_on_policy(&provider).await;
    let created = apply(&provider, "okta_policy_rules", rule_config(&policy_id), None).await;

    let imported = provider
        .import("okta_policy_rules", &format!("{}/{}", policy_id, created.id))
        .await
        .unwrap();
    assert_eq!(imported.id, created.id);
    assert_eq!(imported.attributes["policyid"], json!(policy_id));
    assert_eq!(imported.attributes["name"], json!("office"));
    assert_eq!(imported.attributes["status"], json!("ACTIVE"));

    provider
        .destroy("okta_policy_rules", &imported)
        .await
        .unwrap();
    assert_eq!(okta.call_count("delete_policy_rule").await, 1);
    assert!(
        provider
            .refresh("okta_policy_rules", &created)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_rule_identity_changes_rejected_before_remote_calls() {
    let (provider, okta) = provider().await;
    let policy_id = sign_on_policy(&provider).await;
    let state = apply(&provider, "okta_policy_rules", rule_config(&policy_id), None).await;

    let mut renamed = rule_config(&policy_id);
    renamed["name"] = json!("branch office");

    let mut retyped = rule_config(&policy_id);
    retyped["type"] = json!("PASSWORD");
    retyped.as_object_mut().unwrap().remove("actions");
    retyped.as_object_mut().unwrap().remove("conditions");

    for config in [renamed, retyped] {
        okta.clear_calls().await;
        let error = provider
            .plan("okta_policy_rules", config, Some(&state))
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "You cannot change the policyid field, name field, or type field of an existing Policy Rule"
        );
        assert!(okta.calls().await.is_empty());
    }
}
