//! API error types for the TAPD client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when talking to the TAPD API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A credential or identifier required by the client is missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network, connection or timeout failure.
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// The response status code.
        status: StatusCode,
        /// The response body, possibly empty.
        body: String,
    },

    /// The response body was not a JSON object.
    #[error("Invalid API response: {0}")]
    Decode(String),

    /// The client-credentials exchange did not yield a token.
    #[error("Token exchange failed: {0}")]
    AuthExchange(String),

    /// The service reported a logical failure for a business request.
    #[error("TAPD request failed: {path}, info={info}")]
    Api {
        /// The endpoint path that was requested.
        path: String,
        /// The service-provided failure message.
        info: String,
    },

    /// A request to a path outside the read-only allow-list was attempted.
    #[error("Refusing to access endpoint outside the read-only allow-list: {0}")]
    PolicyViolation(String),

    /// Pagination did not terminate within the configured page cap.
    #[error("Pagination exceeded {max_pages} pages for {path}")]
    PageLimitExceeded {
        /// The endpoint being paginated.
        path: String,
        /// The configured cap.
        max_pages: u32,
    },
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

impl ApiError {
    /// Create an error from a non-success HTTP status and its body.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        ApiError::HttpStatus {
            status,
            body: body.to_string(),
        }
    }

    /// Whether the service message looks like an expired or invalid token.
    ///
    /// Matching is case-insensitive on the substrings `token`, `expire` and `invalid`.
    pub fn is_suspected_auth_failure(info: &str) -> bool {
        let info = info.to_lowercase();
        AUTH_FAILURE_HINTS.iter().any(|hint| info.contains(hint))
    }
}

const AUTH_FAILURE_HINTS: [&str; 3] = ["token", "expire", "invalid"];
