use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status category key for finished work.
pub const CATEGORY_DONE: &str = "done";
/// Status category key for work in progress.
pub const CATEGORY_IN_PROGRESS: &str = "indeterminate";

/// A raw issue as returned by the search endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Issue {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub assignee: Option<Assignee>,
    #[serde(default)]
    pub project: Option<ProjectRef>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    #[serde(default)]
    pub resolutiondate: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub duedate: Option<String>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    /// Everything else, including custom fields such as story points.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "statusCategory")]
    pub status_category: Option<StatusCategory>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusCategory {
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignee {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectRef {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Priority {
    #[serde(default)]
    pub name: Option<String>,
}

impl Issue {
    pub fn status_category(&self) -> Option<&str> {
        self.fields
            .status
            .as_ref()
            .and_then(|s| s.status_category.as_ref())
            .and_then(|c| c.key.as_deref())
    }

    pub fn status_name(&self) -> Option<&str> {
        self.fields.status.as_ref().and_then(|s| s.name.as_deref())
    }

    pub fn is_done(&self) -> bool {
        self.status_category() == Some(CATEGORY_DONE)
    }

    pub fn is_in_progress(&self) -> bool {
        self.status_category() == Some(CATEGORY_IN_PROGRESS)
    }

    pub fn project_key(&self) -> Option<&str> {
        self.fields.project.as_ref().and_then(|p| p.key.as_deref())
    }

    pub fn project_name(&self) -> Option<&str> {
        self.fields.project.as_ref().and_then(|p| p.name.as_deref())
    }

    /// True if the assignee's account id, display name or email equals `user_id`.
    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        match &self.fields.assignee {
            Some(a) => {
                a.account_id.as_deref() == Some(user_id)
                    || a.display_name.as_deref() == Some(user_id)
                    || a.email_address.as_deref() == Some(user_id)
            }
            None => false,
        }
    }

    /// Numeric value of a custom field; absent, null and non-numeric values are 0.
    pub fn numeric_field(&self, field: &str) -> f64 {
        self.fields
            .extra
            .get(field)
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
    }
}

/// Raw body of `GET /rest/api/{v}/search`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub start_at: u64,
}

/// Raw entry of `GET /rest/api/{v}/user/search`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UserResponse {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub account_type: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

/// A user account matched by a directory lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraUser {
    pub account_id: Option<String>,
    pub display_name: Option<String>,
    pub email_address: Option<String>,
    /// `atlassian` when the tracker omits it.
    pub account_type: String,
    /// Only an explicit `false` marks the account inactive.
    pub active: bool,
}

impl From<UserResponse> for JiraUser {
    fn from(raw: UserResponse) -> Self {
        Self {
            account_id: raw.account_id,
            display_name: raw.display_name,
            email_address: raw.email_address,
            account_type: raw
                .account_type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "atlassian".to_string()),
            active: raw.active != Some(false),
        }
    }
}

/// Jira error body; any of the three message shapes may be present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub error_messages: Vec<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ErrorResponse {
    pub fn best_message(&self) -> Option<String> {
        if !self.error_messages.is_empty() {
            Some(self.error_messages.join("; "))
        } else if let Some(m) = &self.message {
            Some(m.clone())
        } else {
            self.error_message.clone()
        }
    }
}
