/// Builder for JQL expressions with optional filters.
///
/// Clauses are always emitted in the same order: assignee, created range,
/// project. Identifiers are wrapped in double quotes verbatim; embedded quote
/// characters are passed through unescaped, so callers must not feed it
/// untrusted identifiers.
#[derive(Debug, Clone, Default)]
pub struct JqlBuilder {
    assignees: Vec<String>,
    created_after: Option<String>,
    created_before: Option<String>,
    projects: Vec<String>,
}

impl JqlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assignees<S: AsRef<str>>(mut self, ids: &[S]) -> Self {
        self.assignees = ids.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    /// Inclusive lower bound on `created` (`YYYY-MM-DD`).
    pub fn created_after(mut self, date: &str) -> Self {
        self.created_after = Some(date.to_string());
        self
    }

    /// Inclusive upper bound on `created` (`YYYY-MM-DD`).
    pub fn created_before(mut self, date: &str) -> Self {
        self.created_before = Some(date.to_string());
        self
    }

    pub fn projects<S: AsRef<str>>(mut self, keys: &[S]) -> Self {
        self.projects = keys.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn build(&self) -> String {
        let mut clauses = Vec::new();

        if !self.assignees.is_empty() {
            clauses.push(format!("assignee IN ({})", quote_list(&self.assignees)));
        }
        if let Some(ref date) = self.created_after {
            clauses.push(format!("created >= \"{date}\""));
        }
        if let Some(ref date) = self.created_before {
            clauses.push(format!("created <= \"{date}\""));
        }
        if !self.projects.is_empty() {
            clauses.push(format!("project IN ({})", quote_list(&self.projects)));
        }

        clauses.join(" AND ")
    }
}

/// `assignee IN (...) AND created >= start AND created <= end [AND project IN (...)]`
pub fn build_user_query<S: AsRef<str>>(
    user_ids: &[S],
    start_date: &str,
    end_date: &str,
    project_keys: Option<&[S]>,
) -> String {
    let mut builder = JqlBuilder::new()
        .assignees(user_ids)
        .created_after(start_date)
        .created_before(end_date);
    if let Some(keys) = project_keys {
        builder = builder.projects(keys);
    }
    builder.build()
}

/// `created >= start AND created <= end [AND project IN (...)]`
pub fn build_project_query<S: AsRef<str>>(
    start_date: &str,
    end_date: &str,
    project_keys: Option<&[S]>,
) -> String {
    let mut builder = JqlBuilder::new()
        .created_after(start_date)
        .created_before(end_date);
    if let Some(keys) = project_keys {
        builder = builder.projects(keys);
    }
    builder.build()
}

fn quote_list(items: &[String]) -> String {
    items
        .iter()
        .map(|s| format!("\"{s}\""))
        .collect::<Vec<_>>()
        .join(",")
}
