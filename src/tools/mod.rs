pub mod params;

use serde::Serialize;
use serde_json::{json, Value};

pub use params::{
    LookupAccountParams, ProjectAnalyticsParams, SearchIssuesParams, UserAnalyticsParams,
};

use crate::error::{Error, Result};
use crate::JiraAnalytics;

pub const BULK_USER_TOOL: &str = "jira_bulk_user_analytics";
pub const BULK_PROJECT_TOOL: &str = "jira_bulk_project_analytics";
pub const SEARCH_ISSUES_TOOL: &str = "jira_search_issues";
pub const LOOKUP_ACCOUNT_TOOL: &str = "jira_lookup_account_id";

const USER_ERROR_LABEL: &str = "Error in bulk user productivity analysis";
const PROJECT_ERROR_LABEL: &str = "Error in bulk project productivity analysis";
const SEARCH_ERROR_LABEL: &str = "Error searching JIRA issues";
const LOOKUP_ERROR_LABEL: &str = "Error looking up account ID";

/// Name, description and JSON input schema of a callable tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

/// Result of a tool call. Failures are reported in-band with `is_error` set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutput {
    pub content: Vec<Content>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::Text { text: text.into() }],
            is_error: true,
        }
    }

    /// The first text block.
    pub fn as_text(&self) -> &str {
        match self.content.first() {
            Some(Content::Text { text }) => text,
            None => "",
        }
    }
}

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: BULK_USER_TOOL,
            description: "Get comprehensive productivity analytics for multiple users by \
                          accountId in one call. Ideal for team performance analysis, ranking, \
                          and cross-platform correlation.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "users": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Array of user IDs"
                    },
                    "startDate": {
                        "type": "string",
                        "description": "Start date in YYYY-MM-DD format"
                    },
                    "endDate": {"type": "string", "description": "End date in YYYY-MM-DD format"},
                    "includeCorrelation": {
                        "type": "boolean",
                        "description": "Include correlation data for cross-platform analysis",
                        "default": true
                    },
                    "aggregateBy": {
                        "type": "string",
                        "enum": ["user", "project", "sprint"],
                        "description": "How to aggregate the results",
                        "default": "user"
                    },
                    "projectKeys": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Optional array of project keys to filter by"
                    },
                    "cloudId": {"type": "string", "description": "valid jira cloud id."}
                },
                "required": ["users", "startDate", "endDate", "cloudId"]
            }),
        },
        ToolDefinition {
            name: BULK_PROJECT_TOOL,
            description: "Get comprehensive productivity analytics for multiple projects by \
                          projectKey in one call. Ideal for team performance analysis, ranking, \
                          and cross-platform correlation.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "startDate": {
                        "type": "string",
                        "description": "Start date in YYYY-MM-DD format"
                    },
                    "endDate": {"type": "string", "description": "End date in YYYY-MM-DD format"},
                    "includeCorrelation": {
                        "type": "boolean",
                        "description": "Include correlation data for cross-platform analysis",
                        "default": true
                    },
                    "projectKeys": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "array of project keys to filter by"
                    },
                    "aggregateBy": {
                        "type": "string",
                        "enum": ["user", "project", "sprint"],
                        "description": "How to aggregate the results",
                        "default": "project"
                    },
                    "cloudId": {"type": "string", "description": "valid jira cloud id."}
                },
                "required": ["startDate", "endDate", "projectKeys", "cloudId"]
            }),
        },
        ToolDefinition {
            name: SEARCH_ISSUES_TOOL,
            description: "Search for Jira issues or tasks or tickets using a JQL query string. \
                          Returns one page of results.",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "searchString": {
                        "type": "string",
                        "description": "JQL query string. Use account ids for assignee and \
                                        project keys for project."
                    },
                    "cloudId": {"type": "string", "description": "valid jira cloud id."},
                    "minimalFields": {
                        "type": "boolean",
                        "description": "Request only summary, status, assignee and dates",
                        "default": false
                    },
                    "startAt": {
                        "type": "number",
                        "description": "The index of the first issue to return",
                        "default": 0
                    },
                    "pageSize": {
                        "type": "number",
                        "description": "The number of issues to return per page",
                        "default": 50
                    }
                },
                "required": ["searchString"]
            }),
        },
        ToolDefinition {
            name: LOOKUP_ACCOUNT_TOOL,
            description: "Look up Jira account ID by email or display name",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "searchString": {
                        "type": "string",
                        "description": "The display name or email address of the user to lookup."
                    },
                    "cloudId": {"type": "string", "description": "valid jira cloud id."}
                },
                "required": ["searchString", "cloudId"]
            }),
        },
    ]
}

/// Run a tool by name. Never fails: every error becomes error text.
pub async fn call_tool(service: &JiraAnalytics, name: &str, args: Value) -> ToolOutput {
    match name {
        BULK_USER_TOOL => into_output(run_user_tool(service, args).await, USER_ERROR_LABEL),
        BULK_PROJECT_TOOL => {
            into_output(run_project_tool(service, args).await, PROJECT_ERROR_LABEL)
        }
        SEARCH_ISSUES_TOOL => {
            into_output(run_search_tool(service, args).await, SEARCH_ERROR_LABEL)
        }
        LOOKUP_ACCOUNT_TOOL => {
            into_output(run_lookup_tool(service, args).await, LOOKUP_ERROR_LABEL)
        }
        other => ToolOutput::error(Error::UnknownTool(other.to_string()).to_string()),
    }
}

async fn run_user_tool(service: &JiraAnalytics, args: Value) -> Result<String> {
    let params: UserAnalyticsParams = decode(args)?;
    service.bulk_user_analytics(&params).await?.to_json()
}

async fn run_project_tool(service: &JiraAnalytics, args: Value) -> Result<String> {
    let params: ProjectAnalyticsParams = decode(args)?;
    let projects = service.bulk_project_analytics(&params).await?;
    crate::report::projects_to_json(&projects)
}

async fn run_search_tool(service: &JiraAnalytics, args: Value) -> Result<String> {
    let params: SearchIssuesParams = decode(args)?;
    let page = service.search_issues(&params).await?;
    Ok(format!(
        "JIRA Search Results for query: \"{}\"\n\n{}",
        params.search_string,
        serde_json::to_string_pretty(&page)?
    ))
}

async fn run_lookup_tool(service: &JiraAnalytics, args: Value) -> Result<String> {
    let params: LookupAccountParams = decode(args)?;
    let users = service.lookup_account_id(&params).await?;
    Ok(format!("Atlassian Resources: {}", serde_json::to_string_pretty(&users)?))
}

fn decode<T: serde::de::DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| Error::InvalidParams(e.to_string()))
}

fn into_output(result: Result<String>, label: &str) -> ToolOutput {
    match result {
        Ok(text) => ToolOutput::text(text),
        Err(e) => {
            log::warn!("{label}: {e}");
            ToolOutput::error(format!("{label}: {e}"))
        }
    }
}
