use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};

use serde::de::DeserializeOwned;

use super::types::{ErrorResponse, JiraUser, SearchResponse, UserResponse};
use super::{IssueSource, JiraFlavor, SearchPage, SearchRequest, UserDirectory};
use crate::config::JiraConfig;
use crate::error::{Error, Result};

/// Gateway prefix for OAuth access to a Cloud site by its cloud id.
pub const EXTERNAL_BASE_URL: &str = "https://api.atlassian.com/ex/jira";

const MINIMAL_FIELDS: &str = "summary,status,created,updated,assignee,project";
const FULL_FIELDS: &str =
    "summary,assignee,status,created,updated,resolutiondate,priority,duedate,labels,project";

/// How requests authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// OAuth access token or personal access token.
    Bearer(String),
    /// Email plus API token, sent as HTTP Basic.
    Basic { email: String, api_token: String },
}

impl Credentials {
    /// Classify a raw token. An `email:token` pair is Basic; anything else,
    /// including JWT-shaped OAuth tokens, is sent as a bearer token.
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        match token.split_once(':') {
            Some((email, api_token)) if !email.is_empty() && !api_token.is_empty() => {
                Credentials::Basic {
                    email: email.to_string(),
                    api_token: api_token.to_string(),
                }
            }
            _ => Credentials::Bearer(token.to_string()),
        }
    }

    pub fn is_bearer(&self) -> bool {
        matches!(self, Credentials::Bearer(_))
    }
}

/// Search client for the Jira REST API.
#[derive(Debug, Clone)]
pub struct JiraClient {
    http: reqwest::Client,
    base_url: String,
    external_base_url: String,
    flavor: JiraFlavor,
    credentials: Option<Credentials>,
    story_points_field: String,
    timeout_ms: u64,
}

impl JiraClient {
    pub fn new(config: &JiraConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            external_base_url: EXTERNAL_BASE_URL.to_string(),
            flavor: config.flavor,
            credentials: config.token.as_deref().map(Credentials::parse),
            story_points_field: config.story_points_field.clone(),
            timeout_ms: config.request_timeout_ms,
        })
    }

    /// Overrides the OAuth gateway prefix (for testing with wiremock).
    pub fn with_external_base_url(mut self, url: &str) -> Self {
        self.external_base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Site root for a request. Cloud with an OAuth token goes through the
    /// gateway for the given cloud id; everything else uses the configured URL.
    pub fn instance_base_url(&self, cloud_id: &str) -> String {
        let via_gateway = self.flavor == JiraFlavor::Cloud
            && self.credentials.as_ref().is_some_and(Credentials::is_bearer)
            && !cloud_id.trim().is_empty();
        if via_gateway {
            format!("{}/{}", self.external_base_url, cloud_id.trim())
        } else {
            self.base_url.clone()
        }
    }

    /// `{base}/rest/api/{version}/{endpoint}`.
    pub fn api_url(&self, base: &str, endpoint: &str) -> String {
        format!(
            "{}/rest/api/{}/{}",
            base.trim_end_matches('/'),
            self.flavor.api_version(),
            endpoint.trim_start_matches('/')
        )
    }

    fn fields_for(&self, minimal: bool) -> String {
        if minimal {
            MINIMAL_FIELDS.to_string()
        } else {
            format!("{FULL_FIELDS},{}", self.story_points_field)
        }
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.credentials {
            Some(Credentials::Bearer(token)) => req.bearer_auth(token),
            Some(Credentials::Basic { email, api_token }) => req.basic_auth(email, Some(api_token)),
            None => req,
        }
    }

    /// GET `url` and decode a 2xx body. Non-2xx responses become `Error::Api`.
    async fn get_json<T: DeserializeOwned>(&self, url: url::Url) -> Result<T> {
        let response = self
            .authorize(self.http.get(url))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.best_message())
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_default();
            log::error!("Jira request failed with {status}: {body}");
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        Ok(serde_json::from_str(&body)?)
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(self.timeout_ms)
        } else {
            Error::Http(e)
        }
    }
}

#[async_trait]
impl IssueSource for JiraClient {
    async fn search(&self, cloud_id: &str, request: &SearchRequest) -> Result<SearchPage> {
        let base = self.instance_base_url(cloud_id);
        let endpoint = self.api_url(&base, "search");
        let fields = self.fields_for(request.minimal_fields);
        let max_results = request.page_size.to_string();
        let start_at = request.start_at.to_string();
        let url = url::Url::parse_with_params(
            &endpoint,
            &[
                ("jql", request.jql.as_str()),
                ("maxResults", max_results.as_str()),
                ("startAt", start_at.as_str()),
                ("expand", "changelog"),
                ("fields", fields.as_str()),
            ],
        )?;
        log::debug!("Searching issues: {url}");

        let parsed: SearchResponse = self.get_json(url).await?;
        log::debug!(
            "Search returned {} of {} issues",
            parsed.issues.len(),
            parsed.total
        );

        Ok(SearchPage {
            has_next_page: parsed.total > request.start_at + u64::from(request.page_size),
            issues: parsed.issues,
            total: parsed.total,
            start_at: parsed.start_at,
        })
    }
}

#[async_trait]
impl UserDirectory for JiraClient {
    async fn find_users(
        &self,
        cloud_id: &str,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<JiraUser>> {
        let base = self.instance_base_url(cloud_id);
        let endpoint = self.api_url(&base, "user/search");
        let max_results = max_results.to_string();
        let url = url::Url::parse_with_params(
            &endpoint,
            &[("query", query), ("maxResults", max_results.as_str())],
        )?;
        log::debug!("Looking up users: {url}");

        let users: Vec<UserResponse> = self.get_json(url).await?;
        Ok(users.into_iter().map(JiraUser::from).collect())
    }
}
