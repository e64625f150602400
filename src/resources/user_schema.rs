//! `okta_user_schemas`: custom properties of the default user profile schema.
//!
//! The instance ID is the property index. Only the `custom` subschema can be
//! managed; base properties belong to Okta.

use super::api_err;
use crate::client::OktaApi;
use crate::error::{ProviderError, ProviderResult, ValidationError, ValidationResult};
use crate::models::user_schema::{ArrayItems, Master, Permission};
use crate::models::{SubschemaKind, UserSchema, UserSchemaProperty};
use crate::resource::{ResourceData, ResourceDiff, ResourceHandler, ResourceOperation};
use crate::schema::{AttributeSchema, ResourceSchema};
use async_trait::async_trait;
use log::{info, warn};
use serde_json::{Number, Value};

pub const RESOURCE_NAME: &str = "okta_user_schemas";

const ARRAY: &str = "array";
const SELF_PRINCIPAL: &str = "SELF";

/// Handler for `okta_user_schemas`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserSchemaResource;

fn user_schema_schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_NAME, "Okta user profile schema properties")
        .attribute(
            AttributeSchema::string("subschema")
                .required()
                .one_of(&SubschemaKind::ALL)
                .description("SubSchema Type: base or custom"),
        )
        .attribute(
            AttributeSchema::string("index")
                .required()
                .description("Subschema unique string identifier"),
        )
        .attribute(
            AttributeSchema::string("title")
                .required()
                .description("Subschema title (display name)"),
        )
        .attribute(
            AttributeSchema::string("type")
                .required()
                .one_of(&["string", "boolean", "number", "integer", ARRAY])
                .description("Subschema type: string, boolean, number, integer, or array"),
        )
        .attribute(
            AttributeSchema::string("arraytype")
                .one_of(&["string", "number", "integer", "reference"])
                .description("Subschema array element type, required when type is array"),
        )
        .attribute(AttributeSchema::string("description").description("Custom Subschema description"))
        .attribute(
            AttributeSchema::bool("required")
                .description("whether the Subschema is required, true or false. Default = false"),
        )
        .attribute(AttributeSchema::int("minlength").description("Subschema of type string minlength"))
        .attribute(AttributeSchema::int("maxlength").description("Subschema of type string maxlength"))
        .attribute(
            AttributeSchema::list("enum")
                .description("Custom Subschema enumerated value of the property"),
        )
        .attribute(
            AttributeSchema::string("permissions")
                .default_value("READ_ONLY")
                .one_of(&["HIDE", "READ_ONLY", "READ_WRITE"])
                .description("SubSchema permissions: HIDE, READ_ONLY, or READ_WRITE. Default = READ_ONLY"),
        )
        .attribute(
            AttributeSchema::string("master")
                .default_value("PROFILE_MASTER")
                .one_of(&["PROFILE_MASTER", "OKTA"])
                .description("SubSchema profile manager: PROFILE_MASTER or OKTA. Default = PROFILE_MASTER"),
        )
}

fn validate_user_schema(d: &ResourceDiff) -> ValidationResult<()> {
    if !d.is_new() {
        for field in ["subschema", "index", "type"] {
            if d.has_change(field) {
                return Err(ValidationError::ImmutableSubschemaField {
                    field: field.to_string(),
                });
            }
        }
    }

    if d.get_str("subschema") == Some(SubschemaKind::Base.as_str()) {
        return Err(ValidationError::BaseSubschema);
    }

    let is_array = d.get_str("type") == Some(ARRAY);
    match (is_array, d.get_ok("arraytype").is_some()) {
        (true, false) => Err(ValidationError::MissingArrayType),
        (false, true) => Err(ValidationError::UnexpectedArrayType),
        _ => Ok(()),
    }
}

fn subschema_kind(d: &ResourceData) -> ProviderResult<SubschemaKind> {
    d.get_string("subschema")
        .parse()
        .map_err(|e: String| ValidationError::custom(e).into())
}

async fn fetch_schema<C: OktaApi>(client: &C) -> ProviderResult<UserSchema> {
    client
        .get_user_schema()
        .await
        .map_err(api_err("Listing User Subschemas in Okta"))
}

/// Whether the subschema defines a property under this index.
async fn property_exists<C: OktaApi>(
    client: &C,
    kind: SubschemaKind,
    index: &str,
) -> ProviderResult<bool> {
    let schema = fetch_schema(client).await?;
    Ok(schema.property_names(kind).contains(&index))
}

/// Declared `enum` values, converted to the property's element type. Values
/// that do not parse as that type are sent as strings for Okta to reject.
fn declared_enum(d: &ResourceData) -> Vec<Value> {
    let element_type = match d.get_str("type") {
        Some(ARRAY) => d.get_str("arraytype"),
        other => other,
    };
    d.get_string_list("enum")
        .into_iter()
        .map(|raw| {
            let typed = match element_type {
                Some("integer") => raw.parse::<i64>().ok().map(Value::from),
                Some("number") => raw
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number),
                Some("boolean") => raw.parse::<bool>().ok().map(Value::from),
                _ => None,
            };
            typed.unwrap_or(Value::String(raw))
        })
        .collect()
}

fn declared_property(d: &ResourceData) -> UserSchemaProperty {
    UserSchemaProperty {
        title: d.get_string("title"),
        property_type: d.get_string("type"),
        items: d.get_str("arraytype").map(|item_type| ArrayItems {
            item_type: item_type.to_string(),
        }),
        description: d.get_str("description").map(str::to_string),
        required: d.get_bool("required"),
        min_length: d.get_int("minlength"),
        max_length: d.get_int("maxlength"),
        enum_values: declared_enum(d),
        permissions: vec![Permission {
            principal: SELF_PRINCIPAL.to_string(),
            action: d
                .get_str("permissions")
                .unwrap_or("READ_ONLY")
                .to_string(),
        }],
        master: Some(Master {
            master_type: d
                .get_str("master")
                .unwrap_or("PROFILE_MASTER")
                .to_string(),
        }),
    }
}

async fn post_custom_property<C: OktaApi>(client: &C, d: &ResourceData) -> ProviderResult<()> {
    let index = d.get_string("index");
    let partial = UserSchema::custom_property(&index, Some(declared_property(d)));
    client
        .update_user_schema(&partial)
        .await
        .map_err(api_err("Creating/Updating Custom User Subschema in Okta"))?;
    Ok(())
}

#[async_trait]
impl<C: OktaApi> ResourceHandler<C> for UserSchemaResource {
    fn schema(&self) -> ResourceSchema {
        user_schema_schema()
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

    fn customize_diff(&self, diff: &ResourceDiff) -> ValidationResult<()> {
        validate_user_schema(diff)
    }

    async fn exists(&self, client: &C, d: &ResourceData) -> ProviderResult<bool> {
        property_exists(client, subschema_kind(d)?, &d.get_string("index")).await
    }

    async fn create(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        let index = d.get_string("index");
        info!("Creating User Schema {}", index);

        if property_exists(client, subschema_kind(d)?, &index).await? {
            info!("User Schema {} already exists in Okta. Adding to state.", index);
        } else {
            post_custom_property(client, d).await?;
        }
        d.set_id(index);
        Ok(())
    }

    async fn read(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        let index = d.get_string("index");
        info!("List User Schema {}", index);
        let kind = subschema_kind(d)?;

        let schema = fetch_schema(client).await?;
        let property = schema
            .subschema(kind)
            .and_then(|sub| sub.properties.get(&index))
            .and_then(Option::as_ref);
        match property {
            Some(property) => {
                d.set("title", property.title.as_str());
                d.set("type", property.property_type.as_str());
                if let Some(items) = &property.items {
                    d.set("arraytype", items.item_type.as_str());
                }
            }
            None => {
                warn!("User Schema {} not found in Okta, removing from state", index);
                d.clear_id();
            }
        }
        Ok(())
    }

    async fn update(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        let index = d.get_string("index");
        info!("Update User Schema {}", index);
        d.partial(true);

        if !property_exists(client, subschema_kind(d)?, &index).await? {
            return Err(ProviderError::not_found("User Schema", index));
        }
        post_custom_property(client, d).await?;

        d.partial(false);
        Ok(())
    }

    async fn delete(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        let index = d.get_string("index");
        info!("Delete User Schema {}", index);
        let kind = subschema_kind(d)?;

        if kind == SubschemaKind::Base {
            return Err(ProviderError::unsupported(
                "Error you cannot delete a base subschema",
            ));
        }
        if property_exists(client, kind, &index).await? {
            client
                .update_user_schema(&UserSchema::custom_property(&index, None))
                .await
                .map_err(api_err("Deleting Custom User Subschema in Okta"))?;
        }
        d.clear_id();
        Ok(())
    }

    /// Import a custom property by index.
    async fn import(&self, _client: &C, id: &str) -> ProviderResult<ResourceData> {
        let mut d = ResourceData::for_import(id);
        d.set("subschema", SubschemaKind::Custom.as_str());
        d.set("index", id);
        Ok(d)
    }
}
