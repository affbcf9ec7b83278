//! JSON report.

use serde::Serialize;

use super::Report;
use crate::api::{AuthMode, Counts, Iteration};

#[derive(Serialize)]
struct JsonReport<'a> {
    workspace_id: &'a str,
    generated_at: String,
    auth_mode: AuthMode,
    counts: Counts,
    iteration_filter: Option<&'a str>,
    iterations: &'a [Iteration],
}

/// Render the report as pretty-printed JSON.
///
/// Non-ASCII text is kept as UTF-8 rather than escaped.
pub fn render_json(report: &Report) -> serde_json::Result<String> {
    let doc = JsonReport {
        workspace_id: &report.workspace_id,
        generated_at: report.generated_at.to_rfc3339(),
        auth_mode: report.auth_mode,
        counts: report.counts,
        iteration_filter: report.iteration_filter.as_deref(),
        iterations: &report.iterations,
    };
    serde_json::to_string_pretty(&doc)
}
