//! Centralized error types for tapd-report.
//!
//! Every failure ends the run: it is reported on stderr and the process
//! exits with a non-zero status.

use thiserror::Error;

use crate::api::error::ApiError;
use crate::config::ConfigError;

/// The main application error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// API-related errors.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// The report could not be serialized.
    #[error("failed to render report: {0}")]
    Render(#[from] serde_json::Error),
}

impl AppError {
    /// Get a message suitable for printing to the user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => format!("Configuration error: {}", e),
            AppError::Api(ApiError::Transport(e)) if e.is_timeout() => {
                "Request to TAPD timed out.".to_string()
            }
            AppError::Api(e) => e.to_string(),
            AppError::Render(e) => format!("Failed to render report: {}", e),
        }
    }

    /// Get a suggested action for the user.
    pub fn suggested_action(&self) -> Option<&'static str> {
        match self {
            AppError::Config(ConfigError::MissingCredentials(_)) => Some(
                "Set TAPD_ACCESS_TOKEN, TAPD_APP_ID + TAPD_APP_SECRET, or TAPD_API_USER + TAPD_API_PASSWORD.",
            ),
            AppError::Config(ConfigError::MissingValue(_)) => {
                Some("Pass --workspace-id or set TAPD_WORKSPACE_ID.")
            }
            AppError::Config(ConfigError::ParseError { .. }) => {
                Some("Check the config file format; credentials are not accepted there.")
            }
            AppError::Api(ApiError::AuthExchange(_)) => {
                Some("Check TAPD_APP_ID and TAPD_APP_SECRET.")
            }
            AppError::Api(ApiError::Transport(_)) => {
                Some("Check your network connection and TAPD_API_BASE_URL, or raise --timeout.")
            }
            AppError::Api(ApiError::PageLimitExceeded { .. }) => {
                Some("Raise --max-pages or narrow --iteration-status.")
            }
            _ => None,
        }
    }
}

/// Result type for application operations.
pub type Result<T> = std::result::Result<T, AppError>;
