//! `okta_policies`: sign-on and password policies.
//!
//! Policies are identified by type and name. A create that finds a policy
//! with the same name adopts it instead of creating a duplicate. System
//! policies (the built-in `Default Policy` of each type) are never deleted,
//! and their status, description, priority and group condition are pinned.
//!
//! Password settings defaults are applied when the payload is built, only
//! when a `settings.password` block is declared:
//!
//! | attribute            | default  |
//! |----------------------|----------|
//! | `minlength`          | 8        |
//! | `minlowercase` etc.  | 1        |
//! | `excludeusername`    | true     |
//! | `dictionarylookup`   | false    |
//! | ages and lockouts    | 0        |
//! | `recoveryquestion`   | ACTIVE   |
//! | `questionminlength`  | 4        |
//! | `recoveryemailtoken` | 10080    |
//! | `smsrecovery`        | INACTIVE |
//! | `skipunlock`         | false    |

use super::{StatusChange, api_err, declared_status, status_change};
use crate::client::OktaApi;
use crate::error::{ProviderError, ProviderResult, ValidationError, ValidationResult};
use crate::models::group::EVERYONE_GROUP;
use crate::models::policy::{
    AnswerComplexity, CommonDictionary, DelegationOptions, DelegationSettings, EmailFactor,
    EmailFactorProperties, PasswordDictionary, RecoveryQuestionFactor, RecoveryQuestionProperties,
    RecoveryToken,
};
use crate::models::{
    AuthProviderCondition, IncludeExclude, PasswordAge, PasswordComplexity, PasswordLockout,
    PasswordSettings, PeopleCondition, Policy, PolicyConditions, PolicySettings, PolicyType,
    RecoveryFactors, RecoverySettings, Status, StatusHolder,
};
use crate::resource::{ResourceData, ResourceDiff, ResourceHandler, ResourceOperation};
use crate::schema::{AttributeSchema, ResourceSchema};
use async_trait::async_trait;
use log::{info, warn};
use serde_json::Value;

pub const RESOURCE_NAME: &str = "okta_policies";

const SIGN_ON_POLICY: &str = "Okta SignOn Policy";
const PASSWORD: &str = "settings.0.password.0.";

/// Profile attributes a password may be checked against.
pub const EXCLUDABLE_ATTRIBUTES: [&str; 2] = ["firstName", "lastName"];

/// Handler for `okta_policies`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyResource;

fn policy_schema() -> ResourceSchema {
    let on_off = ["ACTIVE", "INACTIVE"];
    ResourceSchema::new(RESOURCE_NAME, "Okta sign-on and password policies")
        .attribute(
            AttributeSchema::string("type")
                .required()
                .one_of(&PolicyType::ALL)
                .description("Policy Type: OKTA_SIGN_ON, PASSWORD, MFA_ENROLL, or OAUTH_AUTHORIZATION_POLICY"),
        )
        .attribute(AttributeSchema::string("name").required().description("Policy Name"))
        .attribute(AttributeSchema::string("description").description("Policy Description"))
        .attribute(AttributeSchema::int("priority").description("Policy Priority"))
        .attribute(
            AttributeSchema::string("status")
                .default_value("ACTIVE")
                .one_of(&Status::ALL)
                .description("Policy Status: ACTIVE or INACTIVE"),
        )
        .attribute(
            AttributeSchema::block(
                "conditions",
                vec![
                    AttributeSchema::list("groups").description("List of Group IDs to Include"),
                    AttributeSchema::list("users").description("List of User IDs to Include"),
                    AttributeSchema::block(
                        "authprovider",
                        vec![
                            AttributeSchema::string("provider")
                                .one_of(&["OKTA", "ACTIVE_DIRECTORY"])
                                .description("Authentication Provider: OKTA or ACTIVE_DIRECTORY. Default = OKTA"),
                            AttributeSchema::list("include")
                                .description("List of Active Directory Integrations"),
                        ],
                    ),
                ],
            )
            .description("Conditions that must be met during Policy Evaluation"),
        )
        .attribute(
            AttributeSchema::block(
                "settings",
                vec![AttributeSchema::block(
                    "password",
                    vec![
                        AttributeSchema::int("minlength"),
                        AttributeSchema::int("minlowercase").range(0, 1),
                        AttributeSchema::int("minuppercase").range(0, 1),
                        AttributeSchema::int("minnumber").range(0, 1),
                        AttributeSchema::int("minsymbol").range(0, 1),
                        AttributeSchema::bool("excludeusername"),
                        AttributeSchema::list("excludeattributes")
                            .description("allowed values = \"firstName\" and/or \"lastName\""),
                        AttributeSchema::bool("dictionarylookup"),
                        AttributeSchema::int("maxagedays"),
                        AttributeSchema::int("expirewarndays"),
                        AttributeSchema::int("minageminutes"),
                        AttributeSchema::int("historycount"),
                        AttributeSchema::int("maxlockoutattempts"),
                        AttributeSchema::int("autounlockminutes"),
                        AttributeSchema::bool("showlockoutfailures"),
                        AttributeSchema::string("recoveryquestion").one_of(&on_off),
                        AttributeSchema::int("questionminlength"),
                        AttributeSchema::int("recoveryemailtoken"),
                        AttributeSchema::string("smsrecovery").one_of(&on_off),
                        AttributeSchema::bool("skipunlock"),
                    ],
                )
                .description("User Password Policies")],
            )
            .description("Policy Level Settings for the Particular Policy Type"),
        )
        .attribute(
            AttributeSchema::bool("system")
                .computed()
                .description("Whether the policy is a built-in default policy"),
        )
}

/// Accept only `firstName` and `lastName`.
pub fn validate_exclude_attributes(values: &[String]) -> ValidationResult<()> {
    if values
        .iter()
        .all(|v| EXCLUDABLE_ATTRIBUTES.contains(&v.as_str()))
    {
        Ok(())
    } else {
        Err(ValidationError::InvalidExcludeAttributes)
    }
}

/// Declared type, rejecting the types this provider does not manage.
fn supported_type(d: &ResourceData) -> ValidationResult<PolicyType> {
    let policy_type: PolicyType = d
        .get_string("type")
        .parse()
        .map_err(ValidationError::custom)?;
    match policy_type {
        PolicyType::OktaSignOn | PolicyType::Password => Ok(policy_type),
        PolicyType::MfaEnroll => Err(ValidationError::UnsupportedType {
            kind: "MFA Policy".to_string(),
        }),
        PolicyType::OAuthAuthorization => Err(ValidationError::UnsupportedType {
            kind: "OAuth Authorization Policy".to_string(),
        }),
    }
}

fn validate_policy(d: &ResourceDiff) -> ValidationResult<()> {
    if !d.is_new() && (d.has_change("type") || d.has_change("name")) {
        return Err(ValidationError::ImmutablePolicyIdentity);
    }

    if supported_type(d)? == PolicyType::OktaSignOn {
        if d.len("conditions.0.authprovider") > 0 {
            return Err(ValidationError::unsupported_option(
                "authprovider condition",
                SIGN_ON_POLICY,
            ));
        }
        if d.len("settings.0.password") > 0 {
            return Err(ValidationError::unsupported_option(
                "password settings",
                SIGN_ON_POLICY,
            ));
        }
    }

    let declared = [
        d.get_ok("conditions.0.groups").is_some(),
        d.get_ok("conditions.0.users").is_some(),
        d.len("conditions.0.authprovider") > 0,
    ];
    if declared.iter().filter(|set| **set).count() > 1 {
        return Err(ValidationError::ConflictingPolicyConditions);
    }

    validate_exclude_attributes(&d.get_string_list(&format!("{}excludeattributes", PASSWORD)))
}

/// Find a policy of the given type by exact name.
pub(crate) async fn find_policy<C: OktaApi>(
    client: &C,
    policy_type: PolicyType,
    name: &str,
) -> ProviderResult<Option<Policy>> {
    let policies = client
        .list_policies(policy_type)
        .await
        .map_err(api_err("Listing Policy in Okta"))?;
    Ok(policies.into_iter().find(|p| p.name == name))
}

/// ID of the built-in `Everyone` group, which system policies always include.
pub(crate) async fn everyone_group_id<C: OktaApi>(client: &C) -> ProviderResult<String> {
    let mut groups = client
        .list_groups(EVERYONE_GROUP)
        .await
        .map_err(api_err("querying Everyone Group ID"))?;
    if groups.len() > 1 {
        return Err(ProviderError::cardinality(
            "Query for Everyone Default Group resulted in more than one group.",
        ));
    }
    groups
        .pop()
        .map(|g| g.id)
        .ok_or_else(|| ProviderError::not_found("Group", EVERYONE_GROUP))
}

fn declared_conditions(d: &ResourceData) -> Option<PolicyConditions> {
    let groups = d.get_string_list("conditions.0.groups");
    let users = d.get_string_list("conditions.0.users");
    let auth_provider = (d.len("conditions.0.authprovider") > 0).then(|| AuthProviderCondition {
        provider: d
            .get_str("conditions.0.authprovider.0.provider")
            .unwrap_or("OKTA")
            .to_string(),
        include: d.get_string_list("conditions.0.authprovider.0.include"),
    });

    if groups.is_empty() && users.is_empty() && auth_provider.is_none() {
        return None;
    }

    let people = (!groups.is_empty() || !users.is_empty()).then(|| PeopleCondition {
        groups: (!groups.is_empty()).then(|| IncludeExclude::include(groups)),
        users: (!users.is_empty()).then(|| IncludeExclude::include(users)),
    });
    Some(PolicyConditions {
        people,
        auth_provider,
    })
}

fn password_settings(d: &ResourceData) -> PasswordSettings {
    let int = |key: &str, default: i64| {
        d.get_ok(&format!("{}{}", PASSWORD, key))
            .and_then(Value::as_i64)
            .unwrap_or(default)
    };
    let flag = |key: &str, default: bool| {
        d.get_ok(&format!("{}{}", PASSWORD, key))
            .and_then(Value::as_bool)
            .unwrap_or(default)
    };

    PasswordSettings {
        complexity: PasswordComplexity {
            min_length: int("minlength", 8),
            min_lower_case: int("minlowercase", 1),
            min_upper_case: int("minuppercase", 1),
            min_number: int("minnumber", 1),
            min_symbol: int("minsymbol", 1),
            exclude_username: flag("excludeusername", true),
            exclude_attributes: d.get_string_list(&format!("{}excludeattributes", PASSWORD)),
            dictionary: PasswordDictionary {
                common: CommonDictionary {
                    exclude: flag("dictionarylookup", false),
                },
            },
        },
        age: PasswordAge {
            max_age_days: int("maxagedays", 0),
            expire_warn_days: int("expirewarndays", 0),
            min_age_minutes: int("minageminutes", 0),
            history_count: int("historycount", 0),
        },
        lockout: PasswordLockout {
            max_attempts: int("maxlockoutattempts", 0),
            auto_unlock_minutes: int("autounlockminutes", 0),
            show_lockout_failures: flag("showlockoutfailures", false),
        },
    }
}

fn password_policy_settings(d: &ResourceData) -> PolicySettings {
    let text = |key: &str, default: &str| {
        d.get_ok(&format!("{}{}", PASSWORD, key))
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    };
    let int = |key: &str, default: i64| {
        d.get_ok(&format!("{}{}", PASSWORD, key))
            .and_then(Value::as_i64)
            .unwrap_or(default)
    };

    // The email recovery factor is required and always active.
    let mut factors = RecoveryFactors {
        recovery_question: None,
        okta_email: Some(EmailFactor {
            status: "ACTIVE".to_string(),
            properties: None,
        }),
        okta_sms: None,
    };

    if d.len("settings.0.password") == 0 {
        return PolicySettings {
            password: None,
            recovery: Some(RecoverySettings { factors }),
            delegation: None,
        };
    }

    factors.recovery_question = Some(RecoveryQuestionFactor {
        status: text("recoveryquestion", "ACTIVE"),
        properties: Some(RecoveryQuestionProperties {
            complexity: AnswerComplexity {
                min_length: int("questionminlength", 4),
            },
        }),
    });
    if let Some(email) = factors.okta_email.as_mut() {
        email.properties = Some(EmailFactorProperties {
            recovery_token: RecoveryToken {
                token_lifetime_minutes: int("recoveryemailtoken", 10080),
            },
        });
    }
    factors.okta_sms = Some(StatusHolder::new(text("smsrecovery", "INACTIVE")));

    PolicySettings {
        password: Some(password_settings(d)),
        recovery: Some(RecoverySettings { factors }),
        delegation: Some(DelegationSettings {
            options: DelegationOptions {
                skip_unlock: d
                    .get_ok(&format!("{}skipunlock", PASSWORD))
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            },
        }),
    }
}

/// Full replacement payload for a policy.
///
/// `existing` is the remote policy for updates; system policies keep their
/// remote description and priority and are pinned to the `Everyone` group.
fn build_policy(
    d: &ResourceData,
    policy_type: PolicyType,
    existing: Option<&Policy>,
    everyone_group: Option<String>,
) -> ProviderResult<Policy> {
    let mut policy = Policy::new(policy_type, d.get_string("name"));

    match (existing, everyone_group) {
        (Some(remote), Some(everyone)) if remote.system => {
            policy.status = Some(Status::Active);
            policy.description = remote.description.clone();
            policy.priority = remote.priority;
            policy.conditions = Some(PolicyConditions {
                people: Some(PeopleCondition {
                    groups: Some(IncludeExclude::include(vec![everyone])),
                    users: None,
                }),
                auth_provider: None,
            });
        }
        _ => {
            policy.description = d.get_str("description").map(str::to_string);
            policy.priority = d.get_int("priority");
            policy.status = Some(declared_status(d)?);
            policy.conditions = declared_conditions(d);
        }
    }

    if policy_type == PolicyType::Password {
        policy.settings = Some(password_policy_settings(d));
    }
    Ok(policy)
}

async fn reconcile_status<C: OktaApi>(
    client: &C,
    policy_id: &str,
    remote: Option<Status>,
    declared: Status,
) -> ProviderResult<()> {
    match status_change(remote, declared) {
        Some(StatusChange::Activate) => client
            .activate_policy(policy_id)
            .await
            .map_err(api_err("Activating Policy")),
        Some(StatusChange::Deactivate) => client
            .deactivate_policy(policy_id)
            .await
            .map_err(api_err("Deactivating Policy")),
        None => Ok(()),
    }
}

async fn update_policy<C: OktaApi>(client: &C, d: &mut ResourceData) -> ProviderResult<()> {
    let name = d.get_string("name");
    info!("Update Policy {}", name);
    d.partial(true);

    let policy_type = supported_type(d)?;
    let existing = find_policy(client, policy_type, &name)
        .await?
        .ok_or_else(|| ProviderError::not_found("Policy", &name))?;
    let policy_id = existing
        .id
        .clone()
        .ok_or_else(|| ProviderError::internal("remote policy has no id"))?;

    let everyone = if existing.system {
        Some(everyone_group_id(client).await?)
    } else {
        None
    };
    let payload = build_policy(d, policy_type, Some(&existing), everyone)?;
    client
        .update_policy(&policy_id, &payload)
        .await
        .map_err(api_err("Updating Policy"))?;
    info!("Okta Policy Updated: {}", policy_id);

    if !existing.system {
        reconcile_status(client, &policy_id, existing.status, declared_status(d)?).await?;
    }

    d.set_id(policy_id);
    d.set("system", existing.system);
    d.partial(false);
    Ok(())
}

#[async_trait]
impl<C: OktaApi> ResourceHandler<C> for PolicyResource {
    fn schema(&self) -> ResourceSchema {
        policy_schema()
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
        validate_policy(diff)
    }

    async fn exists(&self, client: &C, d: &ResourceData) -> ProviderResult<bool> {
        let policy_type = supported_type(d)?;
        Ok(find_policy(client, policy_type, &d.get_string("name"))
            .await?
            .is_some())
    }

    async fn create(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        let name = d.get_string("name");
        info!("Creating Policy {}", name);
        let policy_type = supported_type(d)?;

        match find_policy(client, policy_type, &name).await? {
            Some(existing) => {
                info!("Policy {} already exists in Okta. Adding to state.", name);
                if let Some(id) = existing.id.clone() {
                    d.set_id(id);
                }
                d.set("system", existing.system);
                if existing.system {
                    info!("Policy {} is a System Policy, running Policy Update.", name);
                    update_policy(client, d).await?;
                }
            }
            None => {
                let payload = build_policy(d, policy_type, None, None)?;
                let created = client
                    .create_policy(&payload)
                    .await
                    .map_err(api_err("Creating Policy"))?;
                let policy_id = created
                    .id
                    .clone()
                    .ok_or_else(|| ProviderError::internal("created policy has no id"))?;
                info!("Okta Policy Created: {}", policy_id);

                reconcile_status(client, &policy_id, created.status, declared_status(d)?).await?;
                d.set_id(policy_id);
                d.set("system", created.system);
            }
        }
        Ok(())
    }

    async fn read(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        let name = d.get_string("name");
        info!("List Policy {}", name);
        let policy_type = supported_type(d)?;

        match find_policy(client, policy_type, &name).await? {
            Some(policy) => {
                if let Some(id) = policy.id {
                    d.set_id(id);
                }
                d.set("system", policy.system);
            }
            None => {
                warn!("Policy {} not found in Okta, removing from state", name);
                d.clear_id();
            }
        }
        Ok(())
    }

    async fn update(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        update_policy(client, d).await
    }

    async fn delete(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        let name = d.get_string("name");
        info!("Delete Policy {}", name);
        let policy_type = supported_type(d)?;

        let existing = find_policy(client, policy_type, &name)
            .await?
            .ok_or_else(|| ProviderError::not_found("Policy", &name))?;
        if existing.system {
            warn!("Policy {} is a System Policy, cannot delete from Okta", name);
        } else if let Some(id) = existing.id.as_deref() {
            client
                .delete_policy(id)
                .await
                .map_err(api_err("Deleting Policy from Okta"))?;
        }
        d.clear_id();
        Ok(())
    }

    /// Import by policy ID.
    async fn import(&self, client: &C, id: &str) -> ProviderResult<ResourceData> {
        let policy = client
            .get_policy(id)
            .await
            .map_err(api_err("Listing Policy in Okta"))?
            .ok_or_else(|| ProviderError::not_found("Policy", id))?;

        let mut d = ResourceData::for_import(id);
        d.set("type", policy.policy_type.as_str());
        d.set("name", policy.name.as_str());
        if let Some(description) = policy.description.as_deref() {
            d.set("description", description);
        }
        if let Some(priority) = policy.priority {
            d.set("priority", priority);
        }
        d.set("status", policy.status.unwrap_or_default().as_str());
        Ok(d)
    }
}
