//! `okta_profile_mappings`: property expressions of an existing profile
//! mapping.
//!
//! Okta creates a mapping for every source/target pair on its own, so this
//! resource never creates or deletes mappings. It adopts the mapping of
//! `source_id` and manages its property expressions. With
//! `delete_when_absent`, remote properties missing from the configuration are
//! removed; otherwise they are left alone and kept out of state.

use super::api_err;
use crate::client::OktaApi;
use crate::error::{ProviderError, ProviderResult};
use crate::models::{MappingProperty, MappingSource, ProfileMapping, PushStatus};
use crate::resource::{ResourceData, ResourceHandler, ResourceOperation};
use crate::schema::{AttributeSchema, ResourceSchema};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::{Value, json};
use std::collections::BTreeMap;

pub const RESOURCE_NAME: &str = "okta_profile_mappings";

/// Handler for `okta_profile_mappings`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileMappingResource;

fn endpoint_block(name: &str) -> AttributeSchema {
    AttributeSchema::block(
        name,
        vec![
            AttributeSchema::string("id"),
            AttributeSchema::string("name"),
            AttributeSchema::string("type"),
        ],
    )
    .computed()
}

fn mapping_schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_NAME, "Okta profile mapping properties")
        .attribute(
            AttributeSchema::string("source_id")
                .required()
                .force_new()
                .description("The source id of the mapping to manage."),
        )
        .attribute(AttributeSchema::bool("delete_when_absent").description(
            "Delete mapping properties that are not defined in config. By default, missing properties are kept.",
        ))
        .attribute(endpoint_block("source"))
        .attribute(endpoint_block("target"))
        .attribute(AttributeSchema::block_list(
            "mappings",
            vec![
                AttributeSchema::string("id")
                    .required()
                    .description("The mapping property key."),
                AttributeSchema::string("expression").required(),
                AttributeSchema::string("push_status")
                    .default_value(PushStatus::DontPush.as_str())
                    .one_of(&PushStatus::ALL),
            ],
        ))
}

/// Declared properties, keyed by property name, in declaration order.
fn declared_mappings(d: &ResourceData) -> Vec<(String, MappingProperty)> {
    d.get("mappings")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let key = item.get("id")?.as_str()?;
                    let expression = item.get("expression")?.as_str()?;
                    let push_status = item
                        .get("push_status")
                        .and_then(Value::as_str)
                        .and_then(PushStatus::parse)
                        .unwrap_or_default();
                    Some((
                        key.to_string(),
                        MappingProperty {
                            expression: expression.to_string(),
                            push_status,
                        },
                    ))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn delete_when_absent(d: &ResourceData) -> bool {
    d.get_bool("delete_when_absent").unwrap_or(false)
}

/// Partial mapping to post: every declared property, plus removals of remote
/// properties the configuration leaves out when `delete_when_absent` is set.
fn build_mapping(d: &ResourceData, remote: Option<&ProfileMapping>) -> ProfileMapping {
    let declared = declared_mappings(d);
    let mut properties: BTreeMap<String, Option<MappingProperty>> = BTreeMap::new();

    if delete_when_absent(d) {
        if let Some(remote) = remote {
            for key in remote.properties.keys() {
                if !declared.iter().any(|(declared_key, _)| declared_key == key) {
                    debug!("Removing mapping property {}", key);
                    properties.insert(key.clone(), None);
                }
            }
        }
    }
    for (key, property) in declared {
        properties.insert(key, Some(property));
    }

    ProfileMapping {
        id: d.id().map(str::to_string),
        source: None,
        target: None,
        properties,
    }
}

fn flatten_source(source: Option<&MappingSource>) -> Value {
    match source {
        Some(source) => json!([{
            "id": source.id,
            "name": source.name,
            "type": source.source_type,
        }]),
        None => Value::Null,
    }
}

/// Remote properties as state. Declared keys come first in declaration order;
/// undeclared keys are only kept when they are due for removal.
fn flatten_mappings(d: &ResourceData, remote: &ProfileMapping) -> Value {
    let declared: Vec<String> = declared_mappings(d).into_iter().map(|(key, _)| key).collect();
    let entry = |key: &str, property: &MappingProperty| {
        json!({
            "id": key,
            "expression": property.expression,
            "push_status": property.push_status.as_str(),
        })
    };

    let mut items: Vec<Value> = declared
        .iter()
        .filter_map(|key| {
            let property = remote.properties.get(key)?.as_ref()?;
            Some(entry(key.as_str(), property))
        })
        .collect();
    if delete_when_absent(d) {
        items.extend(
            remote
                .properties
                .iter()
                .filter(|(key, _)| !declared.contains(*key))
                .filter_map(|(key, property)| property.as_ref().map(|p| entry(key.as_str(), p))),
        );
    }
    Value::Array(items)
}

fn mapping_id(d: &ResourceData) -> ProviderResult<String> {
    d.id()
        .map(str::to_string)
        .ok_or_else(|| ProviderError::internal("profile mapping instance has no id"))
}

async fn get_mapping<C: OktaApi>(client: &C, id: &str) -> ProviderResult<Option<ProfileMapping>> {
    client
        .get_mapping(id)
        .await
        .map_err(api_err("retrieving profile mapping"))
}

async fn post_mapping<C: OktaApi>(
    client: &C,
    d: &ResourceData,
    remote: &ProfileMapping,
) -> ProviderResult<ProfileMapping> {
    let id = mapping_id(d)?;
    let payload = build_mapping(d, Some(remote));
    client
        .update_mapping(&id, &payload)
        .await
        .map_err(api_err("updating profile mapping"))
}

fn record(d: &mut ResourceData, mapping: &ProfileMapping) {
    d.set("source", flatten_source(mapping.source.as_ref()));
    d.set("target", flatten_source(mapping.target.as_ref()));
    let mappings = flatten_mappings(d, mapping);
    d.set("mappings", mappings);
}

#[async_trait]
impl<C: OktaApi> ResourceHandler<C> for ProfileMappingResource {
    fn schema(&self) -> ResourceSchema {
        mapping_schema()
    }

    fn operations(&self) -> Vec<ResourceOperation> {
        vec![
            ResourceOperation::Create,
            ResourceOperation::Read,
            ResourceOperation::Update,
            ResourceOperation::Delete,
            ResourceOperation::Import,
        ]
    }

    async fn exists(&self, client: &C, d: &ResourceData) -> ProviderResult<bool> {
        Ok(get_mapping(client, &mapping_id(d)?).await?.is_some())
    }

    async fn create(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        let source_id = d.get_string("source_id");
        info!("Creating Profile Mapping for source {}", source_id);

        let remote = client
            .list_mappings_by_source(&source_id)
            .await
            .map_err(api_err("retrieving profile mapping source"))?
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::not_found("Profile mapping for source", &source_id))?;
        let id = remote
            .id
            .clone()
            .ok_or_else(|| ProviderError::internal("remote profile mapping has no id"))?;
        d.set_id(id);

        let updated = post_mapping(client, d, &remote).await?;
        record(d, &updated);
        Ok(())
    }

    async fn read(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        let id = mapping_id(d)?;
        info!("List Profile Mapping {}", id);

        match get_mapping(client, &id).await? {
            Some(mapping) => record(d, &mapping),
            None => {
                warn!("Profile Mapping {} not found in Okta, removing from state", id);
                d.clear_id();
            }
        }
        Ok(())
    }

    async fn update(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        let id = mapping_id(d)?;
        info!("Update Profile Mapping {}", id);
        d.partial(true);

        let remote = get_mapping(client, &id)
            .await?
            .ok_or_else(|| ProviderError::not_found("Profile Mapping", id.as_str()))?;
        let updated = post_mapping(client, d, &remote).await?;
        record(d, &updated);

        d.partial(false);
        Ok(())
    }

    async fn delete(&self, _client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        info!(
            "Profile Mapping {} lives as long as its source and target, removing from state only",
            d.id().unwrap_or_default()
        );
        d.clear_id();
        Ok(())
    }

    /// Import by mapping ID. The imported state tracks every remote property.
    async fn import(&self, client: &C, id: &str) -> ProviderResult<ResourceData> {
        let mapping = get_mapping(client, id)
            .await?
            .ok_or_else(|| ProviderError::not_found("Profile Mapping", id))?;
        let source_id = mapping
            .source
            .as_ref()
            .map(|source| source.id.clone())
            .unwrap_or_default();

        let mut d = ResourceData::for_import(id);
        d.set("source_id", source_id);
        d.set("delete_when_absent", true);
        Ok(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(config: Value) -> ResourceData {
        let mut config = config;
        mapping_schema().apply_defaults(&mut config);
        let mut d = ResourceData::new(config, None);
        d.set_id("prm1");
        d
    }

    fn remote() -> ProfileMapping {
        let mut properties = BTreeMap::new();
        for key in ["nickName", "title"] {
            properties.insert(
                key.to_string(),
                Some(MappingProperty {
                    expression: format!("appuser.{}", key),
                    push_status: PushStatus::Push,
                }),
            );
        }
        ProfileMapping {
            id: Some("prm1".to_string()),
            source: Some(MappingSource {
                id: "0oa1".to_string(),
                name: "app".to_string(),
                source_type: "appuser".to_string(),
            }),
            target: None,
            properties,
        }
    }

    #[test]
    fn test_push_status_defaults() {
        let d = data(json!({
            "source_id": "0oa1",
            "mappings": [{ "id": "title", "expression": "appuser.jobTitle" }]
        }));
        let mapping = build_mapping(&d, None);
        let property = mapping.properties["title"].as_ref().unwrap();
        assert_eq!(property.push_status, PushStatus::DontPush);
        assert_eq!(mapping.id.as_deref(), Some("prm1"));
    }

    #[test]
    fn test_delete_when_absent() {
        let config = json!({
            "source_id": "0oa1",
            "mappings": [{ "id": "title", "expression": "appuser.jobTitle" }]
        });
        let mapping = build_mapping(&data(config.clone()), Some(&remote()));
        assert!(!mapping.properties.contains_key("nickName"));

        let mut config = config;
        config["delete_when_absent"] = json!(true);
        let mapping = build_mapping(&data(config), Some(&remote()));
        assert_eq!(mapping.properties["nickName"], None);
        assert!(mapping.properties["title"].is_some());
    }

    #[test]
    fn test_state_follows_declared_order() {
        let d = data(json!({
            "source_id": "0oa1",
            "mappings": [
                { "id": "title", "expression": "appuser.title" },
                { "id": "nickName", "expression": "appuser.nickName" }
            ]
        }));
        let flattened = flatten_mappings(&d, &remote());
        assert_eq!(flattened[0]["id"], json!("title"));
        assert_eq!(flattened[1]["id"], json!("nickName"));
        assert_eq!(flattened[1]["push_status"], json!("PUSH"));

        let d = data(json!({
            "source_id": "0oa1",
            "mappings": [{ "id": "title", "expression": "appuser.title" }]
        }));
        assert_eq!(flatten_mappings(&d, &remote()).as_array().unwrap().len(), 1);
    }
}
