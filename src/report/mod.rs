//! Report rendering.
//!
//! A [`Report`] is the snapshot produced by one run; it renders either as a
//! markdown section or as a JSON document.

mod json;
mod markdown;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::api::{AuthMode, Counts, Iteration};

pub use json::render_json;
pub use markdown::render_markdown;

/// Output format of the report.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
pub enum OutputFormat {
    /// Markdown, for humans.
    #[default]
    #[serde(rename = "md")]
    #[value(name = "md")]
    Markdown,
    /// Pretty-printed JSON, for machines.
    #[serde(rename = "json")]
    #[value(name = "json")]
    Json,
}

/// A workspace status snapshot.
#[derive(Debug, Clone)]
pub struct Report {
    /// The workspace reported on.
    pub workspace_id: String,
    /// When the snapshot was taken.
    pub generated_at: DateTime<Local>,
    /// How the client authenticated.
    pub auth_mode: AuthMode,
    /// Work item totals.
    pub counts: Counts,
    /// The iteration status filter, `None` for all statuses.
    pub iteration_filter: Option<String>,
    /// Iterations matching the filter.
    pub iterations: Vec<Iteration>,
}

impl Report {
    /// Render in the requested format.
    pub fn render(&self, format: OutputFormat) -> serde_json::Result<String> {
        match format {
            OutputFormat::Markdown => Ok(render_markdown(self)),
            OutputFormat::Json => render_json(self),
        }
    }
}
