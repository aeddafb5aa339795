use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::metrics::{ProjectAnalytics, UserAnalytics};

/// Aggregate view across every analyzed user.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSummary {
    pub total_users: u64,
    pub total_issues: u64,
    pub total_completed: u64,
    pub total_story_points: f64,
    /// Mean of per-user completion rates, 0 when no users are present.
    pub avg_completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub cached: bool,
    pub generated_at: DateTime<Utc>,
    /// Upstream match count for the search, before per-user filtering.
    pub total_issues_found: u64,
    /// Number of distinct user ids requested.
    pub users_analyzed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserReport {
    pub summary: TeamSummary,
    pub users: Vec<UserAnalytics>,
    pub metadata: ReportMetadata,
}

impl UserReport {
    pub fn new(users: Vec<UserAnalytics>, total_issues_found: u64, users_analyzed: u64) -> Self {
        Self {
            summary: assemble_team_summary(&users),
            users,
            metadata: ReportMetadata {
                cached: false,
                generated_at: Utc::now(),
                total_issues_found,
                users_analyzed,
            },
        }
    }

    /// Copy of this report marked as served from cache.
    pub fn as_cached(&self) -> Self {
        let mut copy = self.clone();
        copy.metadata.cached = true;
        copy
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn assemble_team_summary(users: &[UserAnalytics]) -> TeamSummary {
    if users.is_empty() {
        return TeamSummary::default();
    }

    let mut summary = TeamSummary {
        total_users: users.len() as u64,
        ..Default::default()
    };
    let mut rate_sum = 0.0;
    for user in users {
        summary.total_issues += user.metrics.total_issues;
        summary.total_completed += user.metrics.completed_issues;
        summary.total_story_points += user.metrics.story_points_completed;
        rate_sum += user.metrics.completion_rate;
    }
    summary.avg_completion_rate = rate_sum / users.len() as f64;
    summary
}

pub fn projects_to_json(projects: &[ProjectAnalytics]) -> Result<String> {
    Ok(serde_json::to_string_pretty(projects)?)
}
