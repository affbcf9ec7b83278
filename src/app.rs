//! Report generation flow.
//!
//! Resolves configuration, queries the API and renders the snapshot. Any
//! error aborts the run before anything is printed.

use chrono::Local;
use tracing::{info, instrument};

use crate::api::error::Result as ApiResult;
use crate::api::{Counts, Resource, TapdClient, Transport};
use crate::cli::Cli;
use crate::config::{Profile, Settings};
use crate::error::Result;
use crate::report::Report;

/// Run one report from command-line arguments and return the rendered output.
pub async fn run(cli: &Cli) -> Result<String> {
    let settings = Settings::load(cli.config.as_deref())?;
    let profile = Profile::resolve(cli, &settings)?;
    profile.validate()?;

    let report = generate(&profile).await?;
    Ok(report.render(profile.format)?)
}

/// Query the API for everything a report needs.
#[instrument(skip(profile), fields(workspace_id = %profile.workspace_id))]
pub async fn generate(profile: &Profile) -> Result<Report> {
    let mut client = TapdClient::new(profile)?;
    let report = collect(&mut client, profile).await?;

    info!(
        stories = report.counts.stories,
        bugs = report.counts.bugs,
        tasks = report.counts.tasks,
        iterations = report.iterations.len(),
        "Report collected"
    );
    Ok(report)
}

async fn collect<T: Transport>(client: &mut TapdClient<T>, profile: &Profile) -> ApiResult<Report> {
    let mut counts = Counts::default();
    for resource in Resource::ALL {
        counts.set(resource, client.get_count(resource).await?);
    }

    let iterations = client
        .list_iterations(profile.iteration_status.as_deref(), profile.page_size)
        .await?;

    Ok(Report {
        workspace_id: client.workspace_id().to_string(),
        generated_at: Local::now(),
        auth_mode: client.auth_mode(),
        counts,
        iteration_filter: profile.iteration_status.clone(),
        iterations,
    })
}
