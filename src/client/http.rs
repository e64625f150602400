//! HTTPS transport for the Okta management API.

use super::OktaApi;
use crate::config::Config;
use crate::error::{ApiError, ApiResult, ProviderError, ProviderResult};
use crate::models::{
    Group, Policy, PolicyRule, PolicyType, ProfileMapping, Role, User, UserSchema,
};
use log::{debug, trace};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use url::Url;

const APPLICATION_JSON: &str = "application/json";

/// Error body returned by Okta on non-success responses.
#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct OktaErrorBody {
    error_code: Option<String>,
    error_summary: Option<String>,
}

/// Client for a single Okta organization.
#[derive(Debug, Clone)]
pub struct HttpOktaClient {
    client: Client,
    api_root: Url,
}

impl HttpOktaClient {
    /// Build a client from validated configuration.
    pub fn new(config: &Config) -> ProviderResult<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("SSWS {}", config.api_token))
            .map_err(|_| ProviderError::configuration("api_token contains invalid characters"))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                ProviderError::configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        let api_root = config
            .org_url()?
            .join("api/v1/")
            .map_err(|e| ProviderError::configuration(format!("invalid API root: {}", e)))?;

        Ok(Self { client, api_root })
    }

    /// The `/api/v1/` root every request is resolved against.
    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    /// Resolve path segments under the API root, percent-encoding each one.
    fn url(&self, path: &[&str]) -> ApiResult<Url> {
        if let Some(segment) = path.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(ApiError::InvalidPathSegment(segment.to_string()));
        }
        let mut url = self.api_root.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(path);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        trace!("<- {} {}", status, response.url());
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match serde_json::from_str::<OktaErrorBody>(&body) {
            Ok(decoded) => ApiError::http(
                status.as_u16(),
                decoded.error_code.as_deref(),
                decoded.error_summary.unwrap_or(body),
            ),
            Err(_) => ApiError::http(status.as_u16(), None, body),
        })
    }

    async fn perform_get_request<T: DeserializeOwned>(
        &self,
        path: &[&str],
        query: &[(&str, &str)],
    ) -> ApiResult<T> {
        let url = self.url(path)?;
        debug!("GET {}", url);
        let response = self.send(self.client.get(url).query(query)).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// GET that maps a not-found answer to `None`.
    async fn perform_optional_get_request<T: DeserializeOwned>(
        &self,
        path: &[&str],
    ) -> ApiResult<Option<T>> {
        match self.perform_get_request(path, &[]).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn perform_post_request<R: Serialize, T: DeserializeOwned>(
        &self,
        path: &[&str],
        query: &[(&str, &str)],
        body: &R,
    ) -> ApiResult<T> {
        let url = self.url(path)?;
        debug!("POST {}", url);
        let response = self
            .send(self.client.post(url).query(query).json(body))
            .await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// POST to an endpoint that answers without a body (lifecycle transitions).
    async fn perform_empty_post_request(&self, path: &[&str]) -> ApiResult<()> {
        let url = self.url(path)?;
        debug!("POST {}", url);
        self.send(self.client.post(url)).await?;
        Ok(())
    }

    async fn perform_put_request<R: Serialize, T: DeserializeOwned>(
        &self,
        path: &[&str],
        body: &R,
    ) -> ApiResult<T> {
        let url = self.url(path)?;
        debug!("PUT {}", url);
        let response = self.send(self.client.put(url).json(body)).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn perform_empty_put_request(&self, path: &[&str]) -> ApiResult<()> {
        let url = self.url(path)?;
        debug!("PUT {}", url);
        self.send(self.client.put(url)).await?;
        Ok(())
    }

    async fn perform_delete_request(&self, path: &[&str]) -> ApiResult<()> {
        let url = self.url(path)?;
        debug!("DELETE {}", url);
        self.send(self.client.delete(url)).await?;
        Ok(())
    }
}

impl OktaApi for HttpOktaClient {
    async fn list_policies(&self, policy_type: PolicyType) -> ApiResult<Vec<Policy>> {
        self.perform_get_request(&["policies"], &[("type", policy_type.as_str())])
            .await
    }

    async fn get_policy(&self, policy_id: &str) -> ApiResult<Option<Policy>> {
        self.perform_optional_get_request(&["policies", policy_id])
            .await
    }

    async fn create_policy(&self, policy: &Policy) -> ApiResult<Policy> {
        self.perform_post_request(&["policies"], &[], policy).await
    }

    async fn update_policy(&self, policy_id: &str, policy: &Policy) -> ApiResult<Policy> {
        self.perform_put_request(&["policies", policy_id], policy)
            .await
    }

    async fn delete_policy(&self, policy_id: &str) -> ApiResult<()> {
        self.perform_delete_request(&["policies", policy_id])
            .await
    }

    async fn activate_policy(&self, policy_id: &str) -> ApiResult<()> {
        self.perform_empty_post_request(&["policies", policy_id, "lifecycle", "activate"])
            .await
    }

    async fn deactivate_policy(&self, policy_id: &str) -> ApiResult<()> {
        self.perform_empty_post_request(&["policies", policy_id, "lifecycle", "deactivate"])
            .await
    }

    async fn list_policy_rules(&self, policy_id: &str) -> ApiResult<Vec<PolicyRule>> {
        self.perform_get_request(&["policies", policy_id, "rules"], &[])
            .await
    }

    async fn create_policy_rule(&self, policy_id: &str, rule: &PolicyRule) -> ApiResult<PolicyRule> {
        self.perform_post_request(&["policies", policy_id, "rules"], &[], rule)
            .await
    }

    async fn update_policy_rule(
        &self,
        policy_id: &str,
        rule_id: &str,
        rule: &PolicyRule,
    ) -> ApiResult<PolicyRule> {
        self.perform_put_request(&["policies", policy_id, "rules", rule_id], rule)
            .await
    }

    async fn delete_policy_rule(&self, policy_id: &str, rule_id: &str) -> ApiResult<()> {
        self.perform_delete_request(&["policies", policy_id, "rules", rule_id])
            .await
    }

    async fn activate_policy_rule(&self, policy_id: &str, rule_id: &str) -> ApiResult<()> {
        self.perform_empty_post_request(&[
            "policies", policy_id, "rules", rule_id, "lifecycle", "activate",
        ])
        .await
    }

    async fn deactivate_policy_rule(&self, policy_id: &str, rule_id: &str) -> ApiResult<()> {
        self.perform_empty_post_request(&[
            "policies", policy_id, "rules", rule_id, "lifecycle", "deactivate",
        ])
        .await
    }

    async fn list_groups(&self, query: &str) -> ApiResult<Vec<Group>> {
        self.perform_get_request(&["groups"], &[("q", query)]).await
    }

    async fn list_group_users(&self, group_id: &str) -> ApiResult<Vec<User>> {
        self.perform_get_request(&["groups", group_id, "users"], &[])
            .await
    }

    async fn list_user_groups(&self, user_id: &str) -> ApiResult<Vec<Group>> {
        self.perform_get_request(&["users", user_id, "groups"], &[])
            .await
    }

    async fn add_user_to_group(&self, group_id: &str, user_id: &str) -> ApiResult<()> {
        self.perform_empty_put_request(&["groups", group_id, "users", user_id])
            .await
    }

    async fn remove_user_from_group(&self, group_id: &str, user_id: &str) -> ApiResult<()> {
        self.perform_delete_request(&["groups", group_id, "users", user_id])
            .await
    }

    async fn list_users_by_email(&self, email: &str) -> ApiResult<Vec<User>> {
        let filter = email_filter(email);
        self.perform_get_request(&["users"], &[("filter", filter.as_str())])
            .await
    }

    async fn get_user(&self, user_id: &str) -> ApiResult<Option<User>> {
        self.perform_optional_get_request(&["users", user_id])
            .await
    }

    async fn create_user(&self, user: &User, activate: bool) -> ApiResult<User> {
        let activate = if activate { "true" } else { "false" };
        self.perform_post_request(&["users"], &[("activate", activate)], user)
            .await
    }

    async fn update_user(&self, user_id: &str, user: &User) -> ApiResult<User> {
        self.perform_put_request(&["users", user_id], user)
            .await
    }

    async fn deactivate_user(&self, user_id: &str) -> ApiResult<()> {
        self.perform_empty_post_request(&["users", user_id, "lifecycle", "deactivate"])
            .await
    }

    async fn delete_user(&self, user_id: &str) -> ApiResult<()> {
        self.perform_delete_request(&["users", user_id])
            .await
    }

    async fn list_roles(&self, user_id: &str) -> ApiResult<Vec<Role>> {
        self.perform_get_request(&["users", user_id, "roles"], &[])
            .await
    }

    async fn assign_role(&self, user_id: &str, role_type: &str) -> ApiResult<Role> {
        self.perform_post_request(
            &["users", user_id, "roles"],
            &[],
            &json!({ "type": role_type }),
        )
        .await
    }

    async fn unassign_role(&self, user_id: &str, role_id: &str) -> ApiResult<()> {
        self.perform_delete_request(&["users", user_id, "roles", role_id])
            .await
    }

    async fn get_user_schema(&self) -> ApiResult<UserSchema> {
        self.perform_get_request(&["meta", "schemas", "user", "default"], &[])
            .await
    }

    async fn update_user_schema(&self, schema: &UserSchema) -> ApiResult<UserSchema> {
        self.perform_post_request(&["meta", "schemas", "user", "default"], &[], schema)
            .await
    }

    async fn list_mappings_by_source(&self, source_id: &str) -> ApiResult<Vec<ProfileMapping>> {
        self.perform_get_request(&["mappings"], &[("sourceId", source_id)])
            .await
    }

    async fn get_mapping(&self, mapping_id: &str) -> ApiResult<Option<ProfileMapping>> {
        self.perform_optional_get_request(&["mappings", mapping_id])
            .await
    }

    async fn update_mapping(
        &self,
        mapping_id: &str,
        mapping: &ProfileMapping,
    ) -> ApiResult<ProfileMapping> {
        self.perform_post_request(&["mappings", mapping_id], &[], mapping)
            .await
    }
}

/// Okta filter expression matching users by exact email.
fn email_filter(email: &str) -> String {
    let escaped = email.replace('\\', "\\\\").replace('"', "\\\"");
    format!("profile.email eq \"{}\"", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_root() {
        let client = HttpOktaClient::new(&Config::new("dev-42", "token")).unwrap();
        assert_eq!(client.api_root().as_str(), "https://dev-42.okta.com/api/v1/");
        assert_eq!(
            client
                .url(&["policies", "00p1", "lifecycle", "activate"])
                .unwrap()
                .as_str(),
            "https://dev-42.okta.com/api/v1/policies/00p1/lifecycle/activate"
        );
    }

    #[test]
    fn test_rejects_empty_token() {
        let error = HttpOktaClient::new(&Config::new("dev-42", "")).unwrap_err();
        assert!(matches!(error, ProviderError::Configuration { .. }));
    }

    #[test]
    fn test_email_filter_quotes_value() {
        assert_eq!(
            email_filter("jane@example.com"),
            "profile.email eq \"jane@example.com\""
        );
        assert_eq!(email_filter("a\"b"), "profile.email eq \"a\\\"b\"");
    }

    #[test]
    fn test_email_filter_escapes_backslash_first() {
        assert_eq!(email_filter("a\\b"), r#"profile.email eq "a\\b""#);
        assert_eq!(email_filter("a\\\"b"), r#"profile.email eq "a\\\"b""#);
    }

    #[test]
    fn test_identifiers_stay_in_one_segment() {
        let client = HttpOktaClient::new(&Config::new("dev-42", "token")).unwrap();
        assert_eq!(
            client.url(&["users", "a/b?c#d", "groups"]).unwrap().as_str(),
            "https://dev-42.okta.com/api/v1/users/a%2Fb%3Fc%23d/groups"
        );
        assert_eq!(
            client.url(&["users", "jane doe%"]).unwrap().as_str(),
            "https://dev-42.okta.com/api/v1/users/jane%20doe%25"
        );
    }

    #[test]
    fn test_rejects_dot_segments() {
        let client = HttpOktaClient::new(&Config::new("dev-42", "token")).unwrap();
        for segment in ["..", ".", ""] {
            let error = client.url(&["users", segment, "roles"]).unwrap_err();
            assert!(matches!(error, ApiError::InvalidPathSegment(s) if s == segment));
        }
    }
}
