//! User and administrator role lifecycle.

mod common;

use common::{apply, mutating_operations, profile, provider};
use okta_provider::ProviderError;
use serde_json::{Value, json};

fn ada(role: Option<&str>) -> Value {
    let mut config = json!({
        "firstname": "Ada",
        "lastname": "Lovelace",
        "email": "ada@example.com"
    });
    if let Some(role) = role {
        config["role"] = json!(role);
    }
    config
}

#[tokio::test]
async fn test_create_user_with_role() {
    let (provider, okta) = provider().await;
    let state = apply(&provider, "okta_users", ada(Some("SUPER_ADMIN")), None).await;

    let user = okta.find_user(&state.id).await.unwrap();
    assert_eq!(user.status.as_deref(), Some("ACTIVE"));
    assert_eq!(user.profile.login, "ada@example.com");
    assert_eq!(state.attributes["login"], json!("ada@example.com"));

    let roles = okta.user_roles(&state.id).await;
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].role_type, "SUPER_ADMIN");

    let refreshed = provider.refresh("okta_users", &state).await.unwrap().unwrap();
    assert_eq!(refreshed.attributes["role"], json!("SUPER_ADMIN"));
}

#[tokio::test]
async fn test_role_change_replaces_assignment() {
    let (provider, okta) = provider().await;
    let state = apply(&provider, "okta_users", ada(Some("SUPER_ADMIN")), None).await;

    okta.clear_calls().await;
    apply(
        &provider,
        "okta_users",
        ada(Some("READ_ONLY_ADMIN")),
        Some(&state),
    )
    .await;

    assert_eq!(
        mutating_operations(&okta).await,
        vec!["update_user", "unassign_role", "assign_role"]
    );
    let roles = okta.user_roles(&state.id).await;
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].role_type, "READ_ONLY_ADMIN");
}

#[tokio::test]
async fn test_removing_role_unassigns_it() {
    let (provider, okta) = provider().await;
    let state = apply(&provider, "okta_users", ada(Some("ORG_ADMIN")), None).await;

    let state = apply(&provider, "okta_users", ada(None), Some(&state)).await;
    assert!(okta.user_roles(&state.id).await.is_empty());

    let refreshed = provider.refresh("okta_users", &state).await.unwrap().unwrap();
    assert_eq!(refreshed.attributes["role"], Value::Null);
}

#[tokio::test]
async fn test_existing_user_is_adopted_by_email() {
    let (provider, okta) = provider().await;
    let existing = okta
        .insert_user(profile("Ada", "Lovelace", "ada@example.com"))
        .await;

    let state = apply(&provider, "okta_users", ada(None), None).await;
    assert_eq!(state.id, existing);
    assert!(mutating_operations(&okta).await.is_empty());
}

#[tokio::test]
async fn test_duplicate_email_is_an_error() {
    let (provider, okta) = provider().await;
    let mut twin = profile("Ada", "Lovelace", "ada@example.com");
    okta.insert_user(twin.clone()).await;
    twin.login = "ada.lovelace".to_string();
    okta.insert_user(twin).await;

    let error = provider
        .plan_and_apply("okta_users", ada(None), None)
        .await
        .unwrap_err();
    assert!(matches!(error.source, ProviderError::Cardinality { .. }));
    assert_eq!(
        error.to_string(),
        "Retrieved more than one Okta user for the email ada@example.com"
    );
}

#[tokio::test]
async fn test_delete_deprovisions_then_deletes() {
    let (provider, okta) = provider().await;
    let state = apply(&provider, "okta_users", ada(None), None).await;

    okta.clear_calls().await;
    provider.destroy("okta_users", &state).await.unwrap();
    assert_eq!(
        mutating_operations(&okta).await,
        vec!["deactivate_user", "delete_user"]
    );
    assert!(okta.find_user(&state.id).await.is_none());
    assert!(provider.refresh("okta_users", &state).await.unwrap().is_none());
}

#[tokio::test]
async fn test_import_reads_profile() {
    let (provider, okta) = provider().await;
    let id = okta
        .insert_user(profile("Grace", "Hopper", "grace@example.com"))
        .await;

    let state = provider.import("okta_users", &id).await.unwrap();
    assert_eq!(state.id, id);
    assert_eq!(state.attributes["firstname"], json!("Grace"));
    assert_eq!(state.attributes["email"], json!("grace@example.com"));
    assert_eq!(state.attributes["role"], Value::Null);
}
