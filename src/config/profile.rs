//! Resolved connection and report profile.

use super::{ConfigError, Result, Settings};
use crate::api::{
    AppCredentials, BasicAuth, Credentials, DEFAULT_MAX_PAGES, DEFAULT_PAGE_SIZE,
    DEFAULT_TIMEOUT_SECS,
};
use crate::cli::Cli;
use crate::report::OutputFormat;

/// The default TAPD API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.tapd.cn";

/// The default iteration status filter.
pub const DEFAULT_ITERATION_STATUS: &str = "open";

/// Everything needed to produce one report.
#[derive(Debug, Clone)]
pub struct Profile {
    /// The API base URL, without trailing slash.
    pub base_url: String,

    /// The workspace to report on.
    pub workspace_id: String,

    /// Credentials for the selected auth mode.
    pub credentials: Credentials,

    /// Iteration status filter. `None` lists all statuses.
    pub iteration_status: Option<String>,

    /// Iterations requested per page.
    pub page_size: u32,

    /// Maximum pages fetched for one listing.
    pub max_pages: u32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Output format.
    pub format: OutputFormat,
}

impl Profile {
    /// Merge command-line/environment values over file settings and defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace id or credentials are missing.
    pub fn resolve(cli: &Cli, settings: &Settings) -> Result<Self> {
        let base_url = clean(cli.base_url.as_deref())
            .or_else(|| clean(settings.base_url.as_deref()))
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        let workspace_id = clean(cli.workspace_id.as_deref())
            .or_else(|| clean(settings.workspace_id.as_deref()))
            .ok_or(ConfigError::MissingValue("TAPD_WORKSPACE_ID/--workspace-id"))?
            .to_string();

        let iteration_status = cli
            .iteration_status
            .as_deref()
            .or(settings.iteration_status.as_deref())
            .unwrap_or(DEFAULT_ITERATION_STATUS)
            .trim();
        let iteration_status = (!iteration_status.is_empty()).then(|| iteration_status.to_string());

        let credentials = resolve_credentials(
            clean(cli.api_user.as_deref()),
            clean(cli.api_password.as_deref()),
            clean(cli.app_id.as_deref()),
            clean(cli.app_secret.as_deref()),
            clean(cli.access_token.as_deref()),
        )?;

        Ok(Self {
            base_url,
            workspace_id,
            credentials,
            iteration_status,
            page_size: cli.page_size.or(settings.page_size).unwrap_or(DEFAULT_PAGE_SIZE),
            max_pages: cli.max_pages.or(settings.max_pages).unwrap_or(DEFAULT_MAX_PAGES),
            timeout_secs: cli
                .timeout_secs
                .or(settings.timeout_secs)
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            format: cli.format.or(settings.format).unwrap_or_default(),
        })
    }

    /// Validate this profile.
    ///
    /// Checks that:
    /// - The workspace id is non-empty and has no whitespace
    /// - The base URL starts with http:// or https://
    /// - Page size, page cap and timeout are at least 1
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError::ValidationError` with details if validation fails.
    pub fn validate(&self) -> Result<()> {
        if self.workspace_id.is_empty() {
            return Err(ConfigError::ValidationError(
                "workspace id cannot be empty".to_string(),
            ));
        }

        if self.workspace_id.contains(char::is_whitespace) {
            return Err(ConfigError::ValidationError(format!(
                "workspace id '{}' cannot contain whitespace",
                self.workspace_id
            )));
        }

        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(ConfigError::ValidationError(format!(
                "base URL '{}' must start with http:// or https://",
                self.base_url
            )));
        }

        if self.page_size == 0 {
            return Err(ConfigError::ValidationError(
                "page size must be at least 1".to_string(),
            ));
        }

        if self.max_pages == 0 {
            return Err(ConfigError::ValidationError(
                "max pages must be at least 1".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeout must be at least 1 second".to_string(),
            ));
        }

        Ok(())
    }
}

/// Pick the auth mode from whichever credentials were supplied.
///
/// A token or an app id/secret pair selects bearer mode; otherwise a user and
/// password select Basic Auth.
fn resolve_credentials(
    api_user: Option<&str>,
    api_password: Option<&str>,
    app_id: Option<&str>,
    app_secret: Option<&str>,
    access_token: Option<&str>,
) -> Result<Credentials> {
    let app = match (app_id, app_secret) {
        (Some(id), Some(secret)) => Some(AppCredentials::new(id, secret)),
        (Some(_), None) | (None, Some(_)) if access_token.is_none() => {
            return Err(ConfigError::MissingCredentials(
                "TAPD_APP_ID and TAPD_APP_SECRET must be provided together".to_string(),
            ))
        }
        _ => None,
    };

    if access_token.is_some() || app.is_some() {
        return Ok(Credentials::Bearer {
            app,
            access_token: access_token.map(str::to_string),
        });
    }

    match (api_user, api_password) {
        (Some(user), Some(password)) => Ok(Credentials::Basic(BasicAuth::new(user, password))),
        (Some(_), None) | (None, Some(_)) => Err(ConfigError::MissingCredentials(
            "TAPD_API_USER and TAPD_API_PASSWORD must be provided together".to_string(),
        )),
        (None, None) => Err(ConfigError::MissingCredentials(
            "provide TAPD_ACCESS_TOKEN, TAPD_APP_ID + TAPD_APP_SECRET, or TAPD_API_USER + TAPD_API_PASSWORD"
                .to_string(),
        )),
    }
}

/// Trim a value, treating blanks as absent.
fn clean(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
