use serde::Serialize;

use crate::error::Result;
use crate::metrics::AggregateBy;

/// Filter parameters that identify a cached report.
#[derive(Debug, Clone, Default)]
pub struct CacheKeyParams {
    pub users: Option<Vec<String>>,
    pub start_date: String,
    pub end_date: String,
    pub project_keys: Option<Vec<String>>,
    pub aggregate_by: Option<AggregateBy>,
    pub include_correlation: Option<bool>,
    pub cloud_id: String,
}

/// Field order here is the canonical serialization order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NormalizedParams<'a> {
    users: Option<Vec<&'a str>>,
    start_date: &'a str,
    end_date: &'a str,
    project_keys: Option<Vec<&'a str>>,
    aggregate_by: AggregateBy,
    include_correlation: bool,
    cloud_id: &'a str,
}

/// Deterministic cache key: `{operation}_{json}` over the normalized params.
///
/// List fields are sorted, `aggregate_by` defaults to `user` and
/// `include_correlation` to `false` when absent. These key defaults are
/// independent of the tool-level parameter defaults.
pub fn derive_key(operation: &str, params: &CacheKeyParams) -> Result<String> {
    let normalized = NormalizedParams {
        users: params.users.as_deref().map(sorted),
        start_date: &params.start_date,
        end_date: &params.end_date,
        project_keys: params.project_keys.as_deref().map(sorted),
        aggregate_by: params.aggregate_by.unwrap_or(AggregateBy::User),
        include_correlation: params.include_correlation.unwrap_or(false),
        cloud_id: &params.cloud_id,
    };
    Ok(format!("{operation}_{}", serde_json::to_string(&normalized)?))
}

fn sorted(items: &[String]) -> Vec<&str> {
    let mut out: Vec<&str> = items.iter().map(String::as_str).collect();
    out.sort_unstable();
    out
}
