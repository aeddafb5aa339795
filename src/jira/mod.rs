pub mod client;
pub mod types;

use async_trait::async_trait;
use serde::Serialize;

pub use client::{Credentials, JiraClient};
pub use types::{Issue, JiraUser};

use crate::error::Result;

/// The largest page the analytics tools request. Results beyond it are truncated.
pub const BULK_PAGE_SIZE: u32 = 1000;

/// Parameters of one search call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub jql: String,
    pub page_size: u32,
    /// Ask only for the fields needed for lightweight issue summaries.
    pub minimal_fields: bool,
    pub start_at: u64,
}

impl SearchRequest {
    pub fn new(jql: impl Into<String>) -> Self {
        Self {
            jql: jql.into(),
            page_size: 100,
            minimal_fields: false,
            start_at: 0,
        }
    }

    pub fn page_size(mut self, n: u32) -> Self {
        self.page_size = n;
        self
    }

    pub fn minimal(mut self, val: bool) -> Self {
        self.minimal_fields = val;
        self
    }

    pub fn start_at(mut self, n: u64) -> Self {
        self.start_at = n;
        self
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub issues: Vec<Issue>,
    pub total: u64,
    pub start_at: u64,
    pub has_next_page: bool,
}

/// Anything that can answer a JQL search.
///
/// `cloud_id` identifies the tracker instance; implementations that talk to a
/// single fixed instance may ignore it.
#[async_trait]
pub trait IssueSource: Send + Sync {
    async fn search(&self, cloud_id: &str, request: &SearchRequest) -> Result<SearchPage>;
}

/// Lookup of user accounts by display name or email.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_users(
        &self,
        cloud_id: &str,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<JiraUser>>;
}

/// API dialect of the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JiraFlavor {
    #[default]
    Cloud,
    Server,
}

impl JiraFlavor {
    /// Parse `JIRA_TYPE`. Only `server` selects Server; everything else is Cloud.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("server") {
            JiraFlavor::Server
        } else {
            JiraFlavor::Cloud
        }
    }

    /// REST API version: v3 on Cloud, v2 on Server.
    pub fn api_version(self) -> u8 {
        match self {
            JiraFlavor::Cloud => 3,
            JiraFlavor::Server => 2,
        }
    }
}
