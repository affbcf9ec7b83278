//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

use crate::report::OutputFormat;

/// Generate a read-only status report for a TAPD workspace.
///
/// Authenticate with TAPD_ACCESS_TOKEN, with TAPD_APP_ID + TAPD_APP_SECRET,
/// or with TAPD_API_USER + TAPD_API_PASSWORD.
#[derive(Parser)]
#[command(name = "tapd-report", version, about, long_about = None)]
pub struct Cli {
    /// API base URL [default: https://api.tapd.cn]
    #[arg(long, env = "TAPD_API_BASE_URL")]
    pub base_url: Option<String>,

    /// Workspace to report on
    #[arg(long, env = "TAPD_WORKSPACE_ID")]
    pub workspace_id: Option<String>,

    /// API user for Basic Auth
    #[arg(long, env = "TAPD_API_USER")]
    pub api_user: Option<String>,

    /// API password for Basic Auth
    #[arg(long, env = "TAPD_API_PASSWORD", hide_env_values = true)]
    pub api_password: Option<String>,

    /// Application id for the client-credentials grant
    #[arg(long, env = "TAPD_APP_ID")]
    pub app_id: Option<String>,

    /// Application secret for the client-credentials grant
    #[arg(long, env = "TAPD_APP_SECRET", hide_env_values = true)]
    pub app_secret: Option<String>,

    /// Pre-issued access token
    #[arg(long, env = "TAPD_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Iteration status filter; pass an empty string for all statuses [default: open]
    #[arg(long)]
    pub iteration_status: Option<String>,

    /// Iterations per page [default: 200]
    #[arg(long = "limit")]
    pub page_size: Option<u32>,

    /// Maximum number of iteration pages to fetch [default: 1000]
    #[arg(long)]
    pub max_pages: Option<u32>,

    /// Request timeout in seconds [default: 20]
    #[arg(long = "timeout")]
    pub timeout_secs: Option<u64>,

    /// Output format [default: md]
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Config file [default: <config dir>/tapd-report/config.toml]
    #[arg(long, env = "TAPD_REPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}
