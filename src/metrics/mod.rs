pub mod types;

pub use types::*;

use crate::date_util::{mean_days, parse_timestamp, round2};
use crate::jira::Issue;

/// Compute metrics for a user over an already-fetched issue set.
///
/// Issues match when the assignee's account id, display name or email equals
/// `user_id` exactly. Returns `None` when nothing matches so the caller can
/// drop the user. Identity comes from the first matched issue in input order.
pub fn derive_user_metrics(
    issues: &[Issue],
    user_id: &str,
    include_correlation: bool,
    story_points_field: &str,
) -> Option<UserAnalytics> {
    let matched: Vec<&Issue> = issues.iter().filter(|i| i.is_assigned_to(user_id)).collect();
    let first = matched.first()?;

    let completed: Vec<&Issue> = matched.iter().copied().filter(|i| i.is_done()).collect();
    let in_progress = matched.iter().filter(|i| i.is_in_progress()).count() as u64;
    let total = matched.len() as u64;

    let story_points_completed: f64 = completed
        .iter()
        .map(|i| i.numeric_field(story_points_field))
        .sum();
    let completion_rate = round2(completed.len() as f64 / total as f64 * 100.0);

    let assignee = first.fields.assignee.clone().unwrap_or_default();
    let user_info = UserInfo {
        account_id: assignee.account_id,
        display_name: assignee.display_name,
        email: assignee.email_address,
    };

    let correlation_data = include_correlation.then(|| CorrelationData {
        jira_account_id: user_info.account_id.clone(),
        jira_display_name: user_info.display_name.clone(),
        jira_email: user_info.email.clone(),
        project_keys: distinct_project_keys(&matched),
    });

    Some(UserAnalytics {
        user_id: user_id.to_string(),
        user_info,
        metrics: UserMetrics {
            total_issues: total,
            completed_issues: completed.len() as u64,
            in_progress_issues: in_progress,
            completion_rate,
            story_points_completed,
            avg_resolution_time: avg_resolution_days(&completed),
        },
        correlation_data,
    })
}

/// Compute the issue listing for a project. `None` when no issue belongs to it.
pub fn derive_project_metrics(issues: &[Issue], project_key: &str) -> Option<ProjectAnalytics> {
    let matched: Vec<&Issue> = issues
        .iter()
        .filter(|i| i.project_key() == Some(project_key))
        .collect();
    let first = matched.first()?;

    Some(ProjectAnalytics {
        project_key: project_key.to_string(),
        project_name: first.project_name().map(str::to_string),
        issue_count: matched.len() as u64,
        issues: matched.iter().map(|i| summarize_issue(i)).collect(),
    })
}

/// Per-user metrics for every requested id, skipping ids with no issues.
/// Duplicate ids are analyzed once, at their first position.
pub fn derive_all_users(
    issues: &[Issue],
    user_ids: &[String],
    include_correlation: bool,
    story_points_field: &str,
) -> Vec<UserAnalytics> {
    dedup_preserving_order(user_ids)
        .into_iter()
        .filter_map(|id| derive_user_metrics(issues, id, include_correlation, story_points_field))
        .collect()
}

/// Per-project listings for every requested key, skipping keys with no issues.
pub fn derive_all_projects(issues: &[Issue], project_keys: &[String]) -> Vec<ProjectAnalytics> {
    dedup_preserving_order(project_keys)
        .into_iter()
        .filter_map(|key| derive_project_metrics(issues, key))
        .collect()
}

/// Mean creation-to-resolution time in days over issues that carry a
/// resolution date. Issues with unparseable timestamps are left out.
fn avg_resolution_days(issues: &[&Issue]) -> i64 {
    let durations: Vec<i64> = issues
        .iter()
        .filter_map(|i| {
            let resolved = parse_timestamp(i.fields.resolutiondate.as_deref()?)?;
            let created = parse_timestamp(i.fields.created.as_deref()?)?;
            Some((resolved - created).num_milliseconds())
        })
        .collect();
    mean_days(&durations)
}

fn distinct_project_keys(issues: &[&Issue]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for key in issues.iter().filter_map(|i| i.project_key()) {
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }
    keys
}

fn summarize_issue(issue: &Issue) -> IssueSummary {
    IssueSummary {
        id: issue.id.clone(),
        key: issue.key.clone(),
        summary: issue.fields.summary.clone(),
        status: issue.status_name().map(str::to_string),
        assignee: issue
            .fields
            .assignee
            .as_ref()
            .and_then(|a| a.display_name.clone())
            .unwrap_or_else(|| "Unassigned".to_string()),
        created: issue.fields.created.clone(),
        updated: issue.fields.updated.clone(),
    }
}

fn dedup_preserving_order(items: &[String]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    items
        .iter()
        .map(String::as_str)
        .filter(|s| seen.insert(*s))
        .collect()
}
