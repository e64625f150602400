//! Group membership lifecycle.

mod common;

use common::{apply, mutating_operations, profile, provider};
use okta_provider::client::OktaApi;
use serde_json::json;

#[tokio::test]
async fn test_membership_lifecycle() {
    let (provider, okta) = provider().await;
    let group = okta.insert_group("Engineering").await;
    let user = okta
        .insert_user(profile("Ada", "Lovelace", "ada@example.com"))
        .await;

    let config = json!({ "group_id": group, "user_id": user });
    let state = apply(&provider, "okta_group_memberships", config, None).await;
    assert_eq!(state.id, format!("{}/{}", group, user));
    let members = okta.list_group_users(&group).await.unwrap();
    assert_eq!(members.len(), 1);

    let refreshed = provider
        .refresh("okta_group_memberships", &state)
        .await
        .unwrap();
    assert_eq!(refreshed.map(|s| s.id), Some(state.id.clone()));

    okta.clear_calls().await;
    provider
        .destroy("okta_group_memberships", &state)
        .await
        .unwrap();
    assert_eq!(mutating_operations(&okta).await, vec!["remove_user_from_group"]);
    assert!(
        provider
            .refresh("okta_group_memberships", &state)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_missing_group_reads_as_gone() {
    let (provider, okta) = provider().await;
    let user = okta
        .insert_user(profile("Ada", "Lovelace", "ada@example.com"))
        .await;
    let state = okta_provider::InstanceState {
        id: format!("00gmissing/{}", user),
        attributes: json!({ "group_id": "00gmissing", "user_id": user }),
    };

    assert!(
        provider
            .refresh("okta_group_memberships", &state)
            .await
            .unwrap()
            .is_none()
    );
    provider
        .destroy("okta_group_memberships", &state)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_import_membership() {
    let (provider, okta) = provider().await;
    let group = okta.insert_group("Engineering").await;
    let user = okta
        .insert_user(profile("Ada", "Lovelace", "ada@example.com"))
        .await;
    okta.add_user_to_group(&group, &user).await.unwrap();

    let id = format!("{}/{}", group, user);
    let state = provider
        .import("okta_group_memberships", &id)
        .await
        .unwrap();
    assert_eq!(state.attributes["group_id"], json!(group));
    assert_eq!(state.attributes["user_id"], json!(user));

    assert!(
        provider
            .import("okta_group_memberships", "not-a-membership")
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_refresh_reads_membership_from_user_side() {
    let (provider, okta) = provider().await;
    let group = okta.insert_group("Engineering").await;
    let user = okta
        .insert_user(profile("Ada", "Lovelace", "ada@example.com"))
        .await;
    okta.add_user_to_group(&group, &user).await.unwrap();
    let state = okta_provider::InstanceState {
        id: format!("{}/{}", group, user),
        attributes: json!({ "group_id": group, "user_id": user }),
    };

    okta.clear_calls().await;
    let refreshed = provider
        .refresh("okta_group_memberships", &state)
        .await
        .unwrap();
    assert_eq!(refreshed.map(|s| s.id), Some(state.id.clone()));
    let calls = okta.calls().await;
    assert!(
        calls
            .iter()
            .any(|c| c.operation == "list_user_groups" && c.target == user)
    );
    assert!(calls.iter().all(|c| c.operation != "list_group_users"));

    let gone = okta_provider::InstanceState {
        id: format!("{}/00umissing", group),
        attributes: json!({ "group_id": group, "user_id": "00umissing" }),
    };
    assert!(
        provider
            .refresh("okta_group_memberships", &gone)
            .await
            .unwrap()
            .is_none()
    );
}
