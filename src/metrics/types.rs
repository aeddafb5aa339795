use serde::{Deserialize, Serialize};

/// Dimension a bulk request is aggregated by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateBy {
    User,
    Project,
    Sprint,
}

/// Identity of a user, taken from the assignee of their first matched issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub account_id: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// Productivity metrics for one user over the requested window.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMetrics {
    pub total_issues: u64,
    pub completed_issues: u64,
    pub in_progress_issues: u64,
    /// Percentage, rounded to two decimals.
    pub completion_rate: f64,
    /// Story points summed over completed issues only.
    pub story_points_completed: f64,
    /// Mean days from creation to resolution, rounded to the nearest day.
    pub avg_resolution_time: i64,
}

/// Identity and project membership for joining against external systems.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationData {
    pub jira_account_id: Option<String>,
    pub jira_display_name: Option<String>,
    pub jira_email: Option<String>,
    /// Distinct project keys touched, in first-seen order.
    pub project_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnalytics {
    pub user_id: String,
    pub user_info: UserInfo,
    pub metrics: UserMetrics,
    pub correlation_data: Option<CorrelationData>,
}

/// Lightweight projection of one issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueSummary {
    pub id: String,
    pub key: String,
    pub summary: Option<String>,
    pub status: Option<String>,
    /// Assignee display name, or `Unassigned`.
    pub assignee: String,
    pub created: Option<String>,
    pub updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAnalytics {
    pub project_key: String,
    pub project_name: Option<String>,
    pub issue_count: u64,
    pub issues: Vec<IssueSummary>,
}
