use crate::jira::JiraFlavor;

pub const DEFAULT_BASE_URL: &str = "https://api.atlassian.com";
pub const DEFAULT_STORY_POINTS_FIELD: &str = "customfield_10016";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Connection and field settings for the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JiraConfig {
    pub base_url: String,
    pub flavor: JiraFlavor,
    /// Raw token: an OAuth/personal access token, or `email:api_token`.
    pub token: Option<String>,
    pub story_points_field: String,
    pub request_timeout_ms: u64,
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            flavor: JiraFlavor::Cloud,
            token: None,
            story_points_field: DEFAULT_STORY_POINTS_FIELD.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl JiraConfig {
    /// Load from the process environment, after reading a `.env` file if one exists.
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                log::warn!("Could not load .env file: {e}");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    ///
    /// `JIRA_BEARER_TOKEN` wins over `JIRA_USER_EMAIL` + `JIRA_API_TOKEN`,
    /// which are combined as `email:token`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = get("JIRA_BEARER_TOKEN").or_else(|| {
            match (get("JIRA_USER_EMAIL"), get("JIRA_API_TOKEN")) {
                (Some(email), Some(api_token)) => Some(format!("{email}:{api_token}")),
                _ => None,
            }
        });

        let request_timeout_ms = match get("JIRA_REQUEST_TIMEOUT_MS") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("Ignoring invalid JIRA_REQUEST_TIMEOUT_MS: {raw}");
                DEFAULT_REQUEST_TIMEOUT_MS
            }),
            None => DEFAULT_REQUEST_TIMEOUT_MS,
        };

        Self {
            base_url: get("JIRA_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            flavor: get("JIRA_TYPE")
                .map(|t| JiraFlavor::parse(&t))
                .unwrap_or_default(),
            token,
            story_points_field: get("JIRA_STORY_POINTS_FIELD")
                .unwrap_or_else(|| DEFAULT_STORY_POINTS_FIELD.to_string()),
            request_timeout_ms,
        }
    }
}
