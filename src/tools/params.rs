use serde::Deserialize;

use crate::cache::CacheKeyParams;
use crate::metrics::AggregateBy;

fn default_true() -> bool {
    true
}

fn default_aggregate_user() -> AggregateBy {
    AggregateBy::User
}

fn default_aggregate_project() -> AggregateBy {
    AggregateBy::Project
}

/// Arguments of `jira_bulk_user_analytics`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnalyticsParams {
    /// Account ids, display names or emails.
    pub users: Vec<String>,
    pub start_date: String,
    pub end_date: String,
    #[serde(default = "default_true")]
    pub include_correlation: bool,
    #[serde(default = "default_aggregate_user")]
    pub aggregate_by: AggregateBy,
    #[serde(default)]
    pub project_keys: Option<Vec<String>>,
    pub cloud_id: String,
}

impl UserAnalyticsParams {
    pub fn cache_key_params(&self) -> CacheKeyParams {
        CacheKeyParams {
            users: Some(self.users.clone()),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            project_keys: self.project_keys.clone(),
            aggregate_by: Some(self.aggregate_by),
            include_correlation: Some(self.include_correlation),
            cloud_id: self.cloud_id.clone(),
        }
    }
}

/// Arguments of `jira_bulk_project_analytics`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAnalyticsParams {
    pub start_date: String,
    pub end_date: String,
    pub project_keys: Vec<String>,
    #[serde(default = "default_true")]
    pub include_correlation: bool,
    #[serde(default = "default_aggregate_project")]
    pub aggregate_by: AggregateBy,
    pub cloud_id: String,
}

impl ProjectAnalyticsParams {
    pub fn cache_key_params(&self) -> CacheKeyParams {
        CacheKeyParams {
            users: None,
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            project_keys: Some(self.project_keys.clone()),
            aggregate_by: Some(self.aggregate_by),
            include_correlation: Some(self.include_correlation),
            cloud_id: self.cloud_id.clone(),
        }
    }
}

fn default_page_size() -> u32 {
    50
}

/// Arguments of `jira_search_issues`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIssuesParams {
    /// Raw JQL, passed through unchanged.
    pub search_string: String,
    #[serde(default)]
    pub cloud_id: String,
    #[serde(default)]
    pub minimal_fields: bool,
    #[serde(default)]
    pub start_at: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

/// Arguments of `jira_lookup_account_id`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupAccountParams {
    /// Display name or email address.
    pub search_string: String,
    pub cloud_id: String,
}
