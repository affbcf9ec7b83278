//! tapd-report - a read-only status snapshot of a TAPD workspace.
//!
//! Summarizes story, bug and task counts and lists iterations, printing the
//! result as markdown or JSON.

mod api;
mod app;
mod cli;
mod config;
mod error;
mod logging;
mod report;

use std::process::ExitCode;

use clap::Parser;

use crate::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("[WARN] logging unavailable: {}", e);
    }

    match app::run(&cli).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "Report failed");
            eprintln!("[ERROR] {}", err.user_message());
            if let Some(action) = err.suggested_action() {
                eprintln!("{}", action);
            }
            ExitCode::FAILURE
        }
    }
}
