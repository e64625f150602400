//! `okta_policy_rules`: rules inside a sign-on or password policy.
//!
//! A rule is resolved by name within its parent policy. Okta defaults for the
//! rule actions are filled in when the payload is built, so they never show up
//! as planned changes:
//!
//! * password rules allow password change and reset, and deny self-service
//!   unlock
//! * sign-on rules allow access without MFA, with 120 minute idle and
//!   lifetime session limits and no persistent cookie
//! * a declared network condition connects from `ANYWHERE`, or `ZONE` when
//!   zones are listed
//!
//! The built-in `Default Rule` of each policy cannot be managed.

use super::{StatusChange, api_err, declared_status, status_change};
use crate::client::OktaApi;
use crate::error::{ProviderError, ProviderResult, ValidationError, ValidationResult};
use crate::models::rule::DEFAULT_RULE_NAME;
use crate::models::{
    ALLOW, AccessAction, AuthContextCondition, DENY, IncludeExclude, NetworkCondition,
    PeopleCondition, PolicyRule, PolicyType, RuleActions, RuleConditions, SessionAction,
    SignOnAction, Status,
};
use crate::resource::{ResourceData, ResourceDiff, ResourceHandler, ResourceOperation};
use crate::schema::{AttributeSchema, ResourceSchema};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::Value;

pub const RESOURCE_NAME: &str = "okta_policy_rules";

const PASSWORD_RULE: &str = "Okta Password Policy Rule";
const SIGN_ON_RULE: &str = "Okta SignOn Policy Rule";

const NETWORK: &str = "conditions.0.network";
const SIGNON: &str = "actions.0.signon.0.";
const PASSWORD: &str = "actions.0.password.0.";

const DEFAULT_SESSION_MINUTES: i64 = 120;

/// Handler for `okta_policy_rules`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyRuleResource;

fn rule_schema() -> ResourceSchema {
    let access = [ALLOW, DENY];
    ResourceSchema::new(RESOURCE_NAME, "Rules of Okta sign-on and password policies")
        .attribute(
            AttributeSchema::string("policyid")
                .required()
                .description("Policy ID of the Rule"),
        )
        .attribute(
            AttributeSchema::string("type")
                .required()
                .one_of(&["OKTA_SIGN_ON", "PASSWORD", "MFA_ENROLL"])
                .description("Policy Rule Type: OKTA_SIGN_ON, PASSWORD, or MFA_ENROLL"),
        )
        .attribute(AttributeSchema::string("name").required().description("Policy Rule Name"))
        .attribute(AttributeSchema::int("priority").description("Policy Rule Priority"))
        .attribute(
            AttributeSchema::string("status")
                .default_value("ACTIVE")
                .one_of(&Status::ALL)
                .description("Policy Rule Status: ACTIVE or INACTIVE. Default = ACTIVE"),
        )
        .attribute(
            AttributeSchema::block(
                "conditions",
                vec![
                    AttributeSchema::list("users").description("List of User IDs to Exclude"),
                    AttributeSchema::block(
                        "network",
                        vec![
                            AttributeSchema::string("connection")
                                .one_of(&["ANYWHERE", "ZONE", "ON_NETWORK", "OFF_NETWORK"]),
                            AttributeSchema::list("include").description("The zones to include"),
                            AttributeSchema::list("exclude").description("The zones to exclude"),
                        ],
                    )
                    .description("Network selection mode and the zones to include or exclude"),
                    AttributeSchema::string("authtype")
                        .one_of(&["ANY", "RADIUS"])
                        .description("Authentication entrypoint: ANY or RADIUS. Default = ANY"),
                ],
            )
            .description("Conditions that must be met during Policy Evaluation"),
        )
        .attribute(
            AttributeSchema::block(
                "actions",
                vec![
                    AttributeSchema::block(
                        "password",
                        vec![
                            AttributeSchema::string("passwordchange").one_of(&access),
                            AttributeSchema::string("passwordreset").one_of(&access),
                            AttributeSchema::string("passwordunlock").one_of(&access),
                        ],
                    )
                    .description("Password Policy Rule actions"),
                    AttributeSchema::block(
                        "signon",
                        vec![
                            AttributeSchema::string("access").one_of(&access),
                            AttributeSchema::bool("requiremfa"),
                            AttributeSchema::string("mfaprompt")
                                .one_of(&["DEVICE", "SESSION", "ALWAYS"]),
                            AttributeSchema::bool("remembermfadevice"),
                            AttributeSchema::int("mfalifetime"),
                            AttributeSchema::int("sessionidle")
                                .description("Max minutes a session can be idle. Default = 120"),
                            AttributeSchema::int("sessionlifetime").description(
                                "Max minutes a session is active: Disable = 0. Default = 120",
                            ),
                            AttributeSchema::bool("persistentcookie"),
                        ],
                    )
                    .description("SignOn Policy Rule actions"),
                ],
            )
            .description("Actions for a rule"),
        )
        .attribute(
            AttributeSchema::bool("system")
                .computed()
                .description("Whether the rule is a built-in default rule"),
        )
}

fn rule_type(d: &ResourceData) -> ValidationResult<PolicyType> {
    d.get_string("type").parse().map_err(ValidationError::custom)
}

/// MFA prompts are only rejected when they would actually be enabled.
fn requests_mfa(d: &ResourceDiff) -> bool {
    let enabled = |key: &str| d.get_bool(&format!("{}{}", SIGNON, key)) == Some(true);
    let present = |key: &str| d.get_ok(&format!("{}{}", SIGNON, key)).is_some();
    enabled("requiremfa")
        || enabled("remembermfadevice")
        || present("mfaprompt")
        || present("mfalifetime")
}

fn validate_rule(d: &ResourceDiff) -> ValidationResult<()> {
    if d.get_str("name") == Some(DEFAULT_RULE_NAME) {
        return Err(ValidationError::DefaultPolicyRule);
    }

    if !d.is_new() && (d.has_change("policyid") || d.has_change("type") || d.has_change("name")) {
        return Err(ValidationError::ImmutablePolicyRuleIdentity);
    }

    match rule_type(d)? {
        PolicyType::Password => {
            if d.get_ok("conditions.0.authtype").is_some() {
                return Err(ValidationError::unsupported_option(
                    "authtype condition",
                    PASSWORD_RULE,
                ));
            }
            if d.len("actions.0.signon") > 0 {
                return Err(ValidationError::unsupported_option("signon action", PASSWORD_RULE));
            }
        }
        PolicyType::OktaSignOn => {
            if d.len("actions.0.password") > 0 {
                return Err(ValidationError::unsupported_option("password action", SIGN_ON_RULE));
            }
        }
        PolicyType::MfaEnroll | PolicyType::OAuthAuthorization => {
            return Err(ValidationError::UnsupportedType {
                kind: "MFA Policy Rule".to_string(),
            });
        }
    }

    if d.get_ok(&format!("{}.0.include", NETWORK)).is_some()
        && d.get_ok(&format!("{}.0.exclude", NETWORK)).is_some()
    {
        return Err(ValidationError::ConflictingNetworkZones);
    }

    if requests_mfa(d) {
        return Err(ValidationError::UnsupportedMfaActions);
    }
    Ok(())
}

/// Find a rule by name in its parent policy.
///
/// Fails when the parent policy does not exist.
pub(crate) async fn find_rule<C: OktaApi>(
    client: &C,
    policy_id: &str,
    name: &str,
) -> ProviderResult<Option<PolicyRule>> {
    let policy = client
        .get_policy(policy_id)
        .await
        .map_err(api_err("Listing Policy in Okta"))?;
    if policy.is_none() {
        return Err(ProviderError::MissingPolicy {
            policy_id: policy_id.to_string(),
        });
    }

    let rules = client
        .list_policy_rules(policy_id)
        .await
        .map_err(api_err("Listing Policy Rules in Okta"))?;
    Ok(rules.into_iter().find(|r| r.name == name))
}

fn declared_conditions(d: &ResourceData, rule_type: PolicyType) -> Option<RuleConditions> {
    let users = d.get_string_list("conditions.0.users");
    let people = (!users.is_empty()).then(|| PeopleCondition {
        groups: None,
        users: Some(IncludeExclude::exclude(users)),
    });

    let network = (d.len(NETWORK) > 0).then(|| {
        let include = d.get_string_list(&format!("{}.0.include", NETWORK));
        let exclude = d.get_string_list(&format!("{}.0.exclude", NETWORK));
        let connection = match d.get_str(&format!("{}.0.connection", NETWORK)) {
            Some(connection) => connection.to_string(),
            None if include.is_empty() && exclude.is_empty() => "ANYWHERE".to_string(),
            None => "ZONE".to_string(),
        };
        NetworkCondition {
            connection,
            include,
            exclude,
        }
    });

    let auth_context = match rule_type {
        PolicyType::OktaSignOn => d
            .get_str("conditions.0.authtype")
            .map(|auth_type| AuthContextCondition {
                auth_type: auth_type.to_string(),
            }),
        _ => None,
    };

    if people.is_none() && network.is_none() && auth_context.is_none() {
        return None;
    }
    Some(RuleConditions {
        people,
        network,
        auth_context,
    })
}

fn password_actions(d: &ResourceData) -> RuleActions {
    let access = |key: &str, default: &str| {
        AccessAction::new(
            d.get_ok(&format!("{}{}", PASSWORD, key))
                .and_then(Value::as_str)
                .unwrap_or(default),
        )
    };
    RuleActions {
        password_change: Some(access("passwordchange", ALLOW)),
        self_service_password_reset: Some(access("passwordreset", ALLOW)),
        self_service_unlock: Some(access("passwordunlock", DENY)),
        signon: None,
    }
}

fn signon_actions(d: &ResourceData) -> RuleActions {
    let int = |key: &str, default: i64| {
        d.get_ok(&format!("{}{}", SIGNON, key))
            .and_then(Value::as_i64)
            .unwrap_or(default)
    };
    let signon = SignOnAction {
        access: d
            .get_str(&format!("{}access", SIGNON))
            .unwrap_or(ALLOW)
            .to_string(),
        require_factor: false,
        factor_prompt_mode: None,
        remember_device_by_default: None,
        factor_lifetime: None,
        session: SessionAction {
            max_session_idle_minutes: int("sessionidle", DEFAULT_SESSION_MINUTES),
            max_session_lifetime_minutes: int("sessionlifetime", DEFAULT_SESSION_MINUTES),
            use_persistent_cookie: d
                .get_bool(&format!("{}persistentcookie", SIGNON))
                .unwrap_or(false),
        },
    };
    RuleActions {
        signon: Some(signon),
        ..Default::default()
    }
}

/// Full replacement payload for a rule. System rules stay `ACTIVE` and keep
/// their remote priority.
fn build_rule(
    d: &ResourceData,
    rule_type: PolicyType,
    existing: Option<&PolicyRule>,
) -> ProviderResult<PolicyRule> {
    let mut rule = PolicyRule::new(rule_type, d.get_string("name"));
    match existing {
        Some(remote) if remote.system => {
            rule.status = Some(Status::Active);
            rule.priority = remote.priority;
        }
        _ => {
            rule.status = Some(declared_status(d)?);
            rule.priority = d.get_int("priority");
        }
    }

    rule.conditions = declared_conditions(d, rule_type);
    rule.actions = Some(match rule_type {
        PolicyType::Password => password_actions(d),
        PolicyType::OktaSignOn => signon_actions(d),
        other => {
            return Err(ProviderError::unsupported(format!(
                "{} Policy Rule not supported in this provider at this time",
                other
            )));
        }
    });
    debug!("Policy Rule payload for {}: {:?}", rule.name, rule.actions);
    Ok(rule)
}

async fn reconcile_status<C: OktaApi>(
    client: &C,
    policy_id: &str,
    rule_id: &str,
    remote: Option<Status>,
    declared: Status,
) -> ProviderResult<()> {
    match status_change(remote, declared) {
        Some(StatusChange::Activate) => client
            .activate_policy_rule(policy_id, rule_id)
            .await
            .map_err(api_err("Activating Policy Rule")),
        Some(StatusChange::Deactivate) => client
            .deactivate_policy_rule(policy_id, rule_id)
            .await
            .map_err(api_err("Deactivating Policy Rule")),
        None => Ok(()),
    }
}

fn record(d: &mut ResourceData, rule: &PolicyRule) {
    if let Some(id) = rule.id.as_deref() {
        d.set_id(id);
    }
    d.set("system", rule.system);
}

#[async_trait]
impl<C: OktaApi> ResourceHandler<C> for PolicyRuleResource {
    fn schema(&self) -> ResourceSchema {
        rule_schema()
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
        validate_rule(diff)
    }

    async fn exists(&self, client: &C, d: &ResourceData) -> ProviderResult<bool> {
        Ok(find_rule(client, &d.get_string("policyid"), &d.get_string("name"))
            .await?
            .is_some())
    }

    async fn create(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        let name = d.get_string("name");
        let policy_id = d.get_string("policyid");
        info!("Creating Policy Rule {}", name);

        if let Some(existing) = find_rule(client, &policy_id, &name).await? {
            info!("Policy Rule {} already exists in Okta. Adding to state.", name);
            record(d, &existing);
            return Ok(());
        }

        let payload = build_rule(d, rule_type(d)?, None)?;
        let created = client
            .create_policy_rule(&policy_id, &payload)
            .await
            .map_err(api_err("Creating Policy Rule"))?;
        let rule_id = created
            .id
            .clone()
            .ok_or_else(|| ProviderError::internal("created policy rule has no id"))?;
        info!("Okta Policy Rule Created: {}", rule_id);

        reconcile_status(client, &policy_id, &rule_id, created.status, declared_status(d)?)
            .await?;
        record(d, &created);
        Ok(())
    }

    async fn read(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        let name = d.get_string("name");
        info!("List Policy Rule {}", name);

        match find_rule(client, &d.get_string("policyid"), &name).await? {
            Some(rule) => record(d, &rule),
            None => {
                warn!("Policy Rule {} not found in Okta, removing from state", name);
                d.clear_id();
            }
        }
        Ok(())
    }

    async fn update(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        let name = d.get_string("name");
        let policy_id = d.get_string("policyid");
        info!("Update Policy Rule {}", name);
        d.partial(true);

        let existing = find_rule(client, &policy_id, &name)
            .await?
            .ok_or_else(|| ProviderError::not_found("Policy Rule", &name))?;
        let rule_id = existing
            .id
            .clone()
            .ok_or_else(|| ProviderError::internal("remote policy rule has no id"))?;

        let payload = build_rule(d, rule_type(d)?, Some(&existing))?;
        client
            .update_policy_rule(&policy_id, &rule_id, &payload)
            .await
            .map_err(api_err("Updating Policy Rule"))?;
        info!("Okta Policy Rule Updated: {}", rule_id);

        if !existing.system {
            reconcile_status(client, &policy_id, &rule_id, existing.status, declared_status(d)?)
                .await?;
        }
        record(d, &existing);
        d.partial(false);
        Ok(())
    }

    async fn delete(&self, client: &C, d: &mut ResourceData) -> ProviderResult<()> {
        let name = d.get_string("name");
        let policy_id = d.get_string("policyid");
        info!("Delete Policy Rule {}", name);

        let existing = find_rule(client, &policy_id, &name)
            .await?
            .ok_or_else(|| ProviderError::not_found("Policy Rule", &name))?;
        if existing.system {
            warn!("Policy Rule {} is a System Rule, cannot delete from Okta", name);
        } else if let Some(rule_id) = existing.id.as_deref() {
            client
                .delete_policy_rule(&policy_id, rule_id)
                .await
                .map_err(api_err("Deleting Policy Rule from Okta"))?;
        }
        d.clear_id();
        Ok(())
    }

    /// Import by `<policy_id>/<rule_id>`.
    async fn import(&self, client: &C, id: &str) -> ProviderResult<ResourceData> {
        let (policy_id, rule_id) = id.split_once('/').ok_or_else(|| {
            ProviderError::Validation(ValidationError::custom(format!(
                "policy rule import id must be <policy_id>/<rule_id>, got {}",
                id
            )))
        })?;

        let rules = client
            .list_policy_rules(policy_id)
            .await
            .map_err(api_err("Listing Policy Rules in Okta"))?;
        let rule = rules
            .into_iter()
            .find(|r| r.id.as_deref() == Some(rule_id))
            .ok_or_else(|| ProviderError::not_found("Policy Rule", rule_id))?;

        let mut d = ResourceData::for_import(rule_id);
        d.set("policyid", policy_id);
        d.set("type", rule.rule_type.as_str());
        d.set("name", rule.name.as_str());
        if let Some(priority) = rule.priority {
            d.set("priority", priority);
        }
        d.set("status", rule.status.unwrap_or_default().as_str());
        Ok(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::InstanceState;
    use serde_json::json;

    fn data(config: Value) -> ResourceData {
        let mut config = config;
        rule_schema().apply_defaults(&mut config);
        ResourceData::new(config, None)
    }

    #[test]
    fn test_password_rule_defaults() {
        let d = data(json!({ "policyid": "00p1", "type": "PASSWORD", "name": "r1" }));
        let rule = build_rule(&d, PolicyType::Password, None).unwrap();
        let actions = rule.actions.unwrap();
        assert_eq!(actions.password_change.unwrap().access, "ALLOW");
        assert_eq!(actions.self_service_password_reset.unwrap().access, "ALLOW");
        assert_eq!(actions.self_service_unlock.unwrap().access, "DENY");
        assert!(actions.signon.is_none());
        assert!(rule.conditions.is_none());
        assert_eq!(rule.status, Some(Status::Active));
    }

    #[test]
    fn test_signon_rule_defaults_and_overrides() {
        let d = data(json!({
            "policyid": "00p1",
            "type": "OKTA_SIGN_ON",
            "name": "r1",
            "actions": { "signon": { "sessionlifetime": 0, "persistentcookie": true } }
        }));
        let signon = build_rule(&d, PolicyType::OktaSignOn, None)
            .unwrap()
            .actions
            .unwrap()
            .signon
            .unwrap();
        assert_eq!(signon.access, "ALLOW");
        assert!(!signon.require_factor);
        assert_eq!(signon.session.max_session_idle_minutes, 120);
        assert_eq!(signon.session.max_session_lifetime_minutes, 0);
        assert!(signon.session.use_persistent_cookie);
    }

    #[test]
    fn test_network_connection_defaults() {
        let d = data(json!({
            "policyid": "00p1",
            "type": "OKTA_SIGN_ON",
            "name": "r1",
            "conditions": { "users": ["00u1"], "network": { "include": ["nzo1"] }, "authtype": "RADIUS" }
        }));
        let conditions = declared_conditions(&d, PolicyType::OktaSignOn).unwrap();
        let network = conditions.network.unwrap();
        assert_eq!(network.connection, "ZONE");
        assert_eq!(network.include, vec!["nzo1"]);
        assert_eq!(conditions.people.unwrap().users.unwrap().exclude, vec!["00u1"]);
        assert_eq!(conditions.auth_context.unwrap().auth_type, "RADIUS");

        let d = data(json!({
            "policyid": "00p1",
            "type": "PASSWORD",
            "name": "r1",
            "conditions": { "network": {} }
        }));
        let network = declared_conditions(&d, PolicyType::Password)
            .unwrap()
            .network
            .unwrap();
        assert_eq!(network.connection, "ANYWHERE");
    }

    #[test]
    fn test_system_rule_keeps_priority() {
        let d = data(json!({
            "policyid": "00p1",
            "type": "PASSWORD",
            "name": "r1",
            "status": "INACTIVE",
            "priority": 5
        }));
        let mut remote = PolicyRule::new(PolicyType::Password, "r1");
        remote.system = true;
        remote.priority = Some(1);
        let rule = build_rule(&d, PolicyType::Password, Some(&remote)).unwrap();
        assert_eq!(rule.status, Some(Status::Active));
        assert_eq!(rule.priority, Some(1));
    }

    #[test]
    fn test_validation_messages() {
        let d = data(json!({ "policyid": "00p1", "type": "PASSWORD", "name": "Default Rule" }));
        assert_eq!(
            validate_rule(&d).unwrap_err().to_string(),
            "You cannot edit a default Policy Rule"
        );

        let d = data(json!({
            "policyid": "00p1",
            "type": "PASSWORD",
            "name": "r1",
            "conditions": { "authtype": "ANY" }
        }));
        assert_eq!(
            validate_rule(&d).unwrap_err().to_string(),
            "authtype condition options not supported in the Okta Password Policy Rule"
        );

        let d = data(json!({
            "policyid": "00p1",
            "type": "PASSWORD",
            "name": "r1",
            "actions": { "signon": { "access": "DENY" } }
        }));
        assert_eq!(
            validate_rule(&d).unwrap_err().to_string(),
            "signon action options not supported in the Okta Password Policy Rule"
        );

        let d = data(json!({
            "policyid": "00p1",
            "type": "OKTA_SIGN_ON",
            "name": "r1",
            "actions": { "password": { "passwordchange": "DENY" } }
        }));
        assert_eq!(
            validate_rule(&d).unwrap_err().to_string(),
            "password action options not supported in the Okta SignOn Policy Rule"
        );

        let d = data(json!({
            "policyid": "00p1",
            "type": "OKTA_SIGN_ON",
            "name": "r1",
            "conditions": { "network": { "include": ["nzo1"], "exclude": ["nzo2"] } }
        }));
        assert_eq!(
            validate_rule(&d).unwrap_err(),
            ValidationError::ConflictingNetworkZones
        );
    }

    #[test]
    fn test_mfa_actions() {
        let d = data(json!({
            "policyid": "00p1",
            "type": "OKTA_SIGN_ON",
            "name": "r1",
            "actions": { "signon": { "requiremfa": false, "remembermfadevice": false } }
        }));
        assert!(validate_rule(&d).is_ok());

        let d = data(json!({
            "policyid": "00p1",
            "type": "OKTA_SIGN_ON",
            "name": "r1",
            "actions": { "signon": { "requiremfa": true } }
        }));
        assert_eq!(
            validate_rule(&d).unwrap_err().to_string(),
            "mfa signon actions not supported in this provider at this time"
        );

        let d = data(json!({
            "policyid": "00p1",
            "type": "OKTA_SIGN_ON",
            "name": "r1",
            "actions": { "signon": { "mfaprompt": "DEVICE" } }
        }));
        assert_eq!(validate_rule(&d).unwrap_err(), ValidationError::UnsupportedMfaActions);
    }

    #[test]
    fn test_identity_is_immutable() {
        let prior = InstanceState {
            id: "0pr1".to_string(),
            attributes: json!({ "policyid": "00p1", "type": "PASSWORD", "name": "r1" }),
        };
        let d = ResourceData::new(
            json!({ "policyid": "00p2", "type": "PASSWORD", "name": "r1" }),
            Some(&prior),
        );
        assert_eq!(
            validate_rule(&d).unwrap_err(),
            ValidationError::ImmutablePolicyRuleIdentity
        );
    }
}
