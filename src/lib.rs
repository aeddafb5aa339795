pub mod cache;
pub mod config;
pub mod date_util;
pub mod error;
pub mod jira;
pub mod metrics;
pub mod query;
pub mod report;
pub mod server;
pub mod tools;

use std::sync::Arc;

pub use cache::BulkCache;
pub use config::JiraConfig;
pub use error::{Error, Result};
pub use jira::{IssueSource, JiraClient, JiraUser, SearchPage, SearchRequest, UserDirectory};
pub use metrics::{ProjectAnalytics, UserAnalytics};
pub use query::JqlBuilder;
pub use report::{TeamSummary, UserReport};
pub use tools::{
    LookupAccountParams, ProjectAnalyticsParams, SearchIssuesParams, ToolOutput,
    UserAnalyticsParams,
};

use jira::BULK_PAGE_SIZE;

const USER_OPERATION: &str = "bulk_user_productivity";
const PROJECT_OPERATION: &str = "bulk_project_productivity";
const LOOKUP_MAX_RESULTS: u32 = 10;

/// A finished report as held in the cache.
#[derive(Debug, Clone)]
pub enum CachedReport {
    Users(UserReport),
    Projects(Vec<ProjectAnalytics>),
}

/// Main entry point for bulk analytics.
///
/// Owns the report cache, so separate instances never share entries.
pub struct JiraAnalytics {
    source: Arc<dyn IssueSource>,
    directory: Option<Arc<dyn UserDirectory>>,
    cache: BulkCache<CachedReport>,
    story_points_field: String,
}

impl JiraAnalytics {
    pub fn new(source: Arc<dyn IssueSource>, story_points_field: impl Into<String>) -> Self {
        Self {
            source,
            directory: None,
            cache: BulkCache::new(),
            story_points_field: story_points_field.into(),
        }
    }

    /// Service backed by a live tracker connection.
    pub fn from_config(config: &JiraConfig) -> Result<Self> {
        let client = Arc::new(JiraClient::new(config)?);
        Ok(Self::new(client.clone(), config.story_points_field.clone()).with_directory(client))
    }

    /// Enables account lookups.
    pub fn with_directory(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn cache(&self) -> &BulkCache<CachedReport> {
        &self.cache
    }

    /// Per-user productivity report for the requested users and window.
    pub async fn bulk_user_analytics(&self, params: &UserAnalyticsParams) -> Result<UserReport> {
        if params.users.is_empty() {
            return Err(Error::InvalidParams("users must not be empty".into()));
        }

        let key = cache::derive_key(USER_OPERATION, &params.cache_key_params())?;
        if self.cache.is_valid(&key) {
            if let Some(CachedReport::Users(report)) = self.cache.get(&key) {
                log::info!("Serving bulk user report from cache");
                return Ok(report.as_cached());
            }
        }

        let jql = query::build_user_query(
            &params.users,
            &params.start_date,
            &params.end_date,
            params.project_keys.as_deref(),
        );
        let page = self.fetch(&params.cloud_id, jql, false).await?;

        let users = metrics::derive_all_users(
            &page.issues,
            &params.users,
            params.include_correlation,
            &self.story_points_field,
        );
        let users_analyzed = distinct_count(&params.users);
        log::debug!(
            "Derived metrics for {} of {} users",
            users.len(),
            users_analyzed
        );

        let report = UserReport::new(users, page.total, users_analyzed);
        self.cache.put(key, CachedReport::Users(report.clone()));
        Ok(report)
    }

    /// Issue listings for each requested project over the window.
    pub async fn bulk_project_analytics(
        &self,
        params: &ProjectAnalyticsParams,
    ) -> Result<Vec<ProjectAnalytics>> {
        if params.project_keys.is_empty() {
            return Ok(Vec::new());
        }

        let key = cache::derive_key(PROJECT_OPERATION, &params.cache_key_params())?;
        if self.cache.is_valid(&key) {
            if let Some(CachedReport::Projects(projects)) = self.cache.get(&key) {
                log::info!("Serving bulk project report from cache");
                return Ok(projects);
            }
        }

        let jql = query::build_project_query(
            &params.start_date,
            &params.end_date,
            Some(params.project_keys.as_slice()),
        );
        let page = self.fetch(&params.cloud_id, jql, true).await?;

        let projects = metrics::derive_all_projects(&page.issues, &params.project_keys);
        log::debug!(
            "Derived listings for {} of {} projects",
            projects.len(),
            params.project_keys.len()
        );

        self.cache.put(key, CachedReport::Projects(projects.clone()));
        Ok(projects)
    }

    /// One page of a caller-supplied JQL search. Never cached.
    pub async fn search_issues(&self, params: &SearchIssuesParams) -> Result<SearchPage> {
        let request = SearchRequest::new(params.search_string.as_str())
            .page_size(params.page_size)
            .minimal(params.minimal_fields)
            .start_at(params.start_at);
        log::debug!("JQL Query: {}", request.jql);
        self.source.search(&params.cloud_id, &request).await
    }

    /// Accounts whose display name or email matches the search string.
    pub async fn lookup_account_id(&self, params: &LookupAccountParams) -> Result<Vec<JiraUser>> {
        let directory = self
            .directory
            .as_ref()
            .ok_or_else(|| Error::Config("no user directory configured".into()))?;
        let users = directory
            .find_users(&params.cloud_id, &params.search_string, LOOKUP_MAX_RESULTS)
            .await?;
        log::debug!("Lookup matched {} accounts", users.len());
        Ok(users)
    }

    /// Tool-boundary wrapper: report JSON, or labeled error text.
    pub async fn call_tool(&self, name: &str, args: serde_json::Value) -> ToolOutput {
        tools::call_tool(self, name, args).await
    }

    async fn fetch(&self, cloud_id: &str, jql: String, minimal: bool) -> Result<SearchPage> {
        log::debug!("JQL Query: {jql}");
        log::debug!("Cloud ID: {cloud_id}");
        let request = SearchRequest::new(jql)
            .page_size(BULK_PAGE_SIZE)
            .minimal(minimal);
        let page = self.source.search(cloud_id, &request).await.map_err(|e| {
            log::error!("Issue search failed: {e}");
            e
        })?;
        log::debug!("Total issues found: {}", page.total);
        Ok(page)
    }
}

fn distinct_count(items: &[String]) -> u64 {
    items
        .iter()
        .collect::<std::collections::HashSet<_>>()
        .len() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::jira::Issue;

    /// In-memory issue source that records every request.
    #[derive(Default)]
    struct FakeSource {
        issues: Vec<Issue>,
        fail_status: Mutex<Option<u16>>,
        calls: AtomicUsize,
        requests: Mutex<Vec<(String, SearchRequest)>>,
    }

    impl FakeSource {
        fn with_issues(issues: Vec<Issue>) -> Arc<Self> {
            Arc::new(Self {
                issues,
                ..Default::default()
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl IssueSource for FakeSource {
        async fn search(&self, cloud_id: &str, request: &SearchRequest) -> Result<SearchPage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .push((cloud_id.to_string(), request.clone()));
            if let Some(status) = *self.fail_status.lock() {
                return Err(Error::Api {
                    status,
                    message: "Unauthorized".into(),
                });
            }
            Ok(SearchPage {
                issues: self.issues.clone(),
                total: self.issues.len() as u64,
                start_at: 0,
                has_next_page: false,
            })
        }
    }

    /// Directory that answers every lookup with one fixed account.
    #[derive(Default)]
    struct FakeDirectory {
        queries: Mutex<Vec<(String, String, u32)>>,
    }

    #[async_trait]
    impl UserDirectory for FakeDirectory {
        async fn find_users(
            &self,
            cloud_id: &str,
            query: &str,
            max_results: u32,
        ) -> Result<Vec<JiraUser>> {
            self.queries
                .lock()
                .push((cloud_id.to_string(), query.to_string(), max_results));
            Ok(vec![JiraUser {
                account_id: Some("5b10ac8d82e05b22cc7d4ef5".into()),
                display_name: Some("Ann Lee".into()),
                email_address: Some("ann@example.com".into()),
                account_type: "atlassian".into(),
                active: true,
            }])
        }
    }

    fn issue(
        account: &str,
        category: &str,
        project: &str,
        created: &str,
        resolved: Option<&str>,
    ) -> Issue {
        serde_json::from_value(json!({
            "id": format!("{account}-{created}"),
            "key": format!("{project}-{created}"),
            "fields": {
                "summary": "task",
                "status": {"name": category, "statusCategory": {"key": category}},
                "assignee": {"accountId": account, "displayName": account.to_uppercase()},
                "project": {"key": project, "name": format!("{project} project")},
                "created": created,
                "resolutiondate": resolved,
                "customfield_10016": 3
            }
        }))
        .unwrap()
    }

    fn sample_issues() -> Vec<Issue> {
        vec![
            issue("a", "done", "ENG", "2024-01-01", Some("2024-01-03")),
            issue("a", "new", "ENG", "2024-01-05", None),
            issue("b", "indeterminate", "OPS", "2024-01-02", None),
        ]
    }

    fn user_params(args: serde_json::Value) -> UserAnalyticsParams {
        serde_json::from_value(args).unwrap()
    }

    fn default_user_args() -> serde_json::Value {
        json!({
            "users": ["a", "missing"],
            "startDate": "2024-01-01",
            "endDate": "2024-01-31",
            "includeCorrelation": false,
            "cloudId": "cloud-1"
        })
    }

    #[tokio::test]
    async fn test_bulk_user_analytics_end_to_end() {
        let source = FakeSource::with_issues(sample_issues());
        let service = JiraAnalytics::new(source.clone(), "customfield_10016");

        let report = service
            .bulk_user_analytics(&user_params(default_user_args()))
            .await
            .unwrap();

        assert_eq!(report.users.len(), 1);
        let a = &report.users[0];
        assert_eq!(a.user_id, "a");
        assert_eq!(a.metrics.total_issues, 2);
        assert_eq!(a.metrics.completed_issues, 1);
        assert_eq!(a.metrics.in_progress_issues, 0);
        assert_eq!(a.metrics.completion_rate, 50.0);
        assert_eq!(a.metrics.avg_resolution_time, 2);
        assert_eq!(a.metrics.story_points_completed, 3.0);

        assert_eq!(report.summary.total_users, 1);
        assert_eq!(report.metadata.total_issues_found, 3);
        assert_eq!(report.metadata.users_analyzed, 2);
        assert!(!report.metadata.cached);

        let requests = source.requests.lock();
        let (cloud_id, request) = &requests[0];
        assert_eq!(cloud_id, "cloud-1");
        assert_eq!(request.page_size, 1000);
        assert_eq!(request.start_at, 0);
        assert!(!request.minimal_fields);
        assert_eq!(
            request.jql,
            r#"assignee IN ("a","missing") AND created >= "2024-01-01" AND created <= "2024-01-31""#
        );
    }

    #[tokio::test]
    async fn test_second_call_served_from_cache() {
        let source = FakeSource::with_issues(sample_issues());
        let service = JiraAnalytics::new(source.clone(), "customfield_10016");

        let first = service
            .bulk_user_analytics(&user_params(default_user_args()))
            .await
            .unwrap();

        // Same request with users reordered hits the same entry
        let mut args = default_user_args();
        args["users"] = json!(["missing", "a"]);
        let second = service.bulk_user_analytics(&user_params(args)).await.unwrap();

        assert_eq!(source.calls(), 1);
        assert!(second.metadata.cached);
        assert_eq!(second.users, first.users);

        // The stored copy is not stamped
        let key = cache::derive_key(
            USER_OPERATION,
            &user_params(default_user_args()).cache_key_params(),
        )
        .unwrap();
        match service.cache().get(&key) {
            Some(CachedReport::Users(stored)) => assert!(!stored.metadata.cached),
            other => panic!("unexpected cache entry: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upstream_error_not_cached() {
        let source = FakeSource::with_issues(sample_issues());
        *source.fail_status.lock() = Some(401);
        let service = JiraAnalytics::new(source.clone(), "customfield_10016");

        let output = service
            .call_tool(tools::BULK_USER_TOOL, default_user_args())
            .await;
        assert!(output.is_error);
        assert!(output
            .as_text()
            .starts_with("Error in bulk user productivity analysis: "));
        assert!(output.as_text().contains("401"));
        assert!(service.cache().is_empty());

        *source.fail_status.lock() = None;
        let output = service
            .call_tool(tools::BULK_USER_TOOL, default_user_args())
            .await;
        assert!(!output.is_error);
        assert_eq!(source.calls(), 2);
        assert_eq!(service.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_correlation_default_on_through_tool() {
        let source = FakeSource::with_issues(sample_issues());
        let service = JiraAnalytics::new(source, "customfield_10016");

        let output = service
            .call_tool(
                tools::BULK_USER_TOOL,
                json!({
                    "users": ["a", "B"],
                    "startDate": "2024-01-01",
                    "endDate": "2024-01-31",
                    "cloudId": "cloud-1"
                }),
            )
            .await;
        assert!(!output.is_error);

        let value: serde_json::Value = serde_json::from_str(output.as_text()).unwrap();
        assert_eq!(value["users"].as_array().unwrap().len(), 2);
        assert_eq!(value["users"][0]["correlationData"]["projectKeys"], json!(["ENG"]));
        // Matched on display name
        assert_eq!(value["users"][1]["userInfo"]["accountId"], "b");
        assert_eq!(value["metadata"]["cached"], false);
    }

    #[tokio::test]
    async fn test_empty_users_rejected_without_fetch() {
        let source = FakeSource::with_issues(sample_issues());
        let service = JiraAnalytics::new(source.clone(), "customfield_10016");

        let mut args = default_user_args();
        args["users"] = json!([]);
        let err = service.bulk_user_analytics(&user_params(args)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidParams(_)));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_bulk_project_analytics() {
        let source = FakeSource::with_issues(sample_issues());
        let service = JiraAnalytics::new(source.clone(), "customfield_10016");

        let output = service
            .call_tool(
                tools::BULK_PROJECT_TOOL,
                json!({
                    "startDate": "2024-01-01",
                    "endDate": "2024-01-31",
                    "projectKeys": ["ENG", "NONE"],
                    "cloudId": "cloud-1"
                }),
            )
            .await;
        assert!(!output.is_error);

        let value: serde_json::Value = serde_json::from_str(output.as_text()).unwrap();
        let projects = value.as_array().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0]["projectKey"], "ENG");
        assert_eq!(projects[0]["projectName"], "ENG project");
        assert_eq!(projects[0]["issueCount"], 2);
        assert_eq!(projects[0]["issues"][0]["assignee"], "A");

        let requests = source.requests.lock();
        assert!(requests[0].1.minimal_fields);
        assert_eq!(
            requests[0].1.jql,
            r#"created >= "2024-01-01" AND created <= "2024-01-31" AND project IN ("ENG","NONE")"#
        );
    }

    #[tokio::test]
    async fn test_project_error_label() {
        let source = FakeSource::with_issues(vec![]);
        *source.fail_status.lock() = Some(500);
        let service = JiraAnalytics::new(source, "customfield_10016");

        let output = service
            .call_tool(
                tools::BULK_PROJECT_TOOL,
                json!({
                    "startDate": "2024-01-01",
                    "endDate": "2024-01-31",
                    "projectKeys": ["ENG"],
                    "cloudId": "cloud-1"
                }),
            )
            .await;
        assert!(output.is_error);
        assert_eq!(
            output.as_text(),
            concat!(
                "Error in bulk project productivity analysis: ",
                "JIRA API Error: Unauthorized (Status: 500)"
            )
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_and_bad_args() {
        let service = JiraAnalytics::new(FakeSource::with_issues(vec![]), "customfield_10016");

        let output = service.call_tool("jira_nope", json!({})).await;
        assert!(output.is_error);
        assert_eq!(output.as_text(), "Unknown tool: jira_nope");

        let output = service
            .call_tool(tools::BULK_USER_TOOL, json!({"users": "a"}))
            .await;
        assert!(output.is_error);
        assert!(output
            .as_text()
            .starts_with("Error in bulk user productivity analysis: Invalid parameters:"));
    }

    #[tokio::test]
    async fn test_separate_services_do_not_share_cache() {
        let source = FakeSource::with_issues(sample_issues());
        let one = JiraAnalytics::new(source.clone(), "customfield_10016");
        let two = JiraAnalytics::new(source.clone(), "customfield_10016");

        one.bulk_user_analytics(&user_params(default_user_args())).await.unwrap();
        two.bulk_user_analytics(&user_params(default_user_args())).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_project_report_served_from_cache() {
        let source = FakeSource::with_issues(sample_issues());
        let service = JiraAnalytics::new(source.clone(), "customfield_10016");
        let args = json!({
            "startDate": "2024-01-01",
            "endDate": "2024-01-31",
            "projectKeys": ["OPS", "ENG"],
            "cloudId": "cloud-1"
        });

        let first = service.call_tool(tools::BULK_PROJECT_TOOL, args.clone()).await;
        let second = service.call_tool(tools::BULK_PROJECT_TOOL, args).await;

        assert!(!first.is_error);
        assert_eq!(second, first);
        assert_eq!(source.calls(), 1);
        assert_eq!(service.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_search_issues_passes_query_through() {
        let source = FakeSource::with_issues(sample_issues());
        let service = JiraAnalytics::new(source.clone(), "customfield_10016");
        let args = json!({
            "searchString": "project = ENG ORDER BY created",
            "cloudId": "cloud-1",
            "minimalFields": true,
            "startAt": 20,
            "pageSize": 10
        });

        let output = service.call_tool(tools::SEARCH_ISSUES_TOOL, args.clone()).await;
        assert!(!output.is_error);
        let (header, body) = output.as_text().split_once("\n\n").unwrap();
        assert_eq!(header, r#"JIRA Search Results for query: "project = ENG ORDER BY created""#);
        let page: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(page["total"], 3);
        assert_eq!(page["issues"][0]["key"], "ENG-2024-01-01");

        {
            let requests = source.requests.lock();
            let (cloud_id, request) = &requests[0];
            assert_eq!(cloud_id, "cloud-1");
            assert_eq!(request.jql, "project = ENG ORDER BY created");
            assert_eq!(request.page_size, 10);
            assert_eq!(request.start_at, 20);
            assert!(request.minimal_fields);
        }

        // Searches are never cached
        service.call_tool(tools::SEARCH_ISSUES_TOOL, args).await;
        assert_eq!(source.calls(), 2);
        assert!(service.cache().is_empty());
    }

    #[tokio::test]
    async fn test_search_issues_error_label() {
        let source = FakeSource::with_issues(vec![]);
        *source.fail_status.lock() = Some(400);
        let service = JiraAnalytics::new(source, "customfield_10016");

        let output = service
            .call_tool(tools::SEARCH_ISSUES_TOOL, json!({"searchString": "bad jql"}))
            .await;
        assert!(output.is_error);
        assert_eq!(
            output.as_text(),
            "Error searching JIRA issues: JIRA API Error: Unauthorized (Status: 400)"
        );
    }

    #[tokio::test]
    async fn test_lookup_account_id() {
        let directory = Arc::new(FakeDirectory::default());
        let service = JiraAnalytics::new(FakeSource::with_issues(vec![]), "customfield_10016")
            .with_directory(directory.clone());

        let output = service
            .call_tool(
                tools::LOOKUP_ACCOUNT_TOOL,
                json!({"searchString": "ann@example.com", "cloudId": "cloud-1"}),
            )
            .await;
        assert!(!output.is_error);
        let body = output.as_text().strip_prefix("Atlassian Resources: ").unwrap();
        let users: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(users[0]["accountId"], "5b10ac8d82e05b22cc7d4ef5");
        assert_eq!(users[0]["accountType"], "atlassian");
        assert_eq!(users[0]["active"], true);

        let queries = directory.queries.lock();
        assert_eq!(
            queries[0],
            ("cloud-1".to_string(), "ann@example.com".to_string(), 10)
        );
    }

    #[tokio::test]
    async fn test_lookup_without_directory() {
        let service = JiraAnalytics::new(FakeSource::with_issues(vec![]), "customfield_10016");

        let output = service
            .call_tool(
                tools::LOOKUP_ACCOUNT_TOOL,
                json!({"searchString": "ann", "cloudId": "cloud-1"}),
            )
            .await;
        assert!(output.is_error);
        assert!(output
            .as_text()
            .starts_with("Error looking up account ID: "));
    }
}
