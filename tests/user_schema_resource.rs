//! Custom user profile properties.

mod common;

use common::{apply, provider};
use okta_provider::client::OktaApi;
use okta_provider::models::SubschemaKind;
use okta_provider::{PlanAction, ProviderError, ValidationError};
use serde_json::{Value, json};

fn skills(arraytype: Option<&str>) -> Value {
    let mut config = json!({
        "subschema": "custom",
        "index": "skills",
        "title": "Skills",
        "type": "array",
        "description": "Languages the user writes"
    });
    if let Some(arraytype) = arraytype {
        config["arraytype"] = json!(arraytype);
    }
    config
}

#[tokio::test]
async fn test_array_property_needs_element_type() {
    let (provider, okta) = provider().await;
    let error = provider
        .plan("okta_user_schemas", skills(None), None)
        .unwrap_err();
    assert!(matches!(
        error,
        ProviderError::Validation(ValidationError::MissingArrayType)
    ));
    assert!(okta.calls().await.is_empty());
}

#[tokio::test]
async fn test_create_read_delete_property() {
    let (provider, okta) = provider().await;
    let state = apply(&provider, "okta_user_schemas", skills(Some("string")), None).await;
    assert_eq!(state.id, "skills");

    let schema = okta.get_user_schema().await.unwrap();
    assert!(schema.property_names(SubschemaKind::Custom).contains(&"skills"));
    let property = schema
        .subschema(SubschemaKind::Custom)
        .and_then(|sub| sub.properties.get("skills"))
        .and_then(Option::as_ref)
        .unwrap();
    assert_eq!(property.items.as_ref().unwrap().item_type, "string");
    assert_eq!(property.permissions[0].action, "READ_ONLY");

    let refreshed = provider
        .refresh("okta_user_schemas", &state)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(refreshed.attributes["title"], json!("Skills"));
    assert_eq!(refreshed.attributes["arraytype"], json!("string"));

    provider.destroy("okta_user_schemas", &state).await.unwrap();
    let schema = okta.get_user_schema().await.unwrap();
    assert!(!schema.property_names(SubschemaKind::Custom).contains(&"skills"));
    assert!(
        provider
            .refresh("okta_user_schemas", &state)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_title_change_updates_in_place() {
    let (provider, okta) = provider().await;
    let state = apply(&provider, "okta_user_schemas", skills(Some("string")), None).await;

    let mut renamed = skills(Some("string"));
    renamed["title"] = json!("Programming languages");
    let plan = provider
        .plan("okta_user_schemas", renamed.clone(), Some(&state))
        .unwrap();
    assert_eq!(plan.action, PlanAction::Update);
    provider.apply(plan).await.unwrap();

    let schema = okta.get_user_schema().await.unwrap();
    let property = schema
        .subschema(SubschemaKind::Custom)
        .and_then(|sub| sub.properties.get("skills"))
        .and_then(Option::as_ref)
        .unwrap();
    assert_eq!(property.title, "Programming languages");

    let mut retyped = renamed;
    retyped["type"] = json!("string");
    retyped.as_object_mut().unwrap().remove("arraytype");
    let error = provider
        .plan("okta_user_schemas", retyped, Some(&state))
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "You cannot change the type field for an existing User SubSchema"
    );
}

#[tokio::test]
async fn test_base_subschema_is_read_only() {
    let (provider, _okta) = provider().await;
    let error = provider
        .plan(
            "okta_user_schemas",
            json!({
                "subschema": "base",
                "index": "login",
                "title": "Username",
                "type": "string"
            }),
            None,
        )
        .unwrap_err();
    assert!(matches!(
        error,
        ProviderError::Validation(ValidationError::BaseSubschema)
    ));
}

#[tokio::test]
async fn test_identity_changes_rejected_before_remote_calls() {
    let (provider, okta) = provider().await;
    let state = apply(&provider, "okta_user_schemas", skills(Some("string")), None).await;

    let mut reindexed = skills(Some("string"));
    reindexed["index"] = json!("languages");
    okta.clear_calls().await;
    let error = provider
        .plan("okta_user_schemas", reindexed, Some(&state))
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "You cannot change the index field for an existing User SubSchema"
    );
    assert!(okta.calls().await.is_empty());

    let mut moved = skills(Some("string"));
    moved["subschema"] = json!("base");
    let error = provider
        .plan("okta_user_schemas", moved, Some(&state))
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "You cannot change the subschema field for an existing User SubSchema"
    );
    assert!(okta.calls().await.is_empty());
}
