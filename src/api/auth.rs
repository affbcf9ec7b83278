//! Authentication handling for the TAPD API.
//!
//! TAPD accepts either Basic Auth with an API user and password, or a bearer
//! token obtained by exchanging an application id and secret.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;

/// Basic Auth credentials.
#[derive(Clone)]
pub struct BasicAuth {
    /// The API user name.
    user: String,
    /// The complete "Basic ..." header value.
    auth_header: String,
}

impl BasicAuth {
    /// Create Basic Auth credentials from a user and password.
    ///
    /// The password is immediately encoded and the raw value is not stored.
    pub fn new(user: &str, password: &str) -> Self {
        Self {
            user: user.to_string(),
            auth_header: build_basic_header(user, password),
        }
    }

    /// Get the authorization header value for HTTP requests.
    pub fn header_value(&self) -> &str {
        &self.auth_header
    }
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// Application credentials used for the client-credentials grant.
#[derive(Clone, PartialEq, Eq)]
pub struct AppCredentials {
    /// The application id.
    pub app_id: String,
    /// The application secret.
    pub app_secret: String,
}

impl AppCredentials {
    /// Create application credentials.
    pub fn new(app_id: &str, app_secret: &str) -> Self {
        Self {
            app_id: app_id.to_string(),
            app_secret: app_secret.to_string(),
        }
    }

    /// The "Basic ..." header used when requesting a token.
    pub fn header_value(&self) -> String {
        build_basic_header(&self.app_id, &self.app_secret)
    }
}

impl fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppCredentials")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

/// The credentials a client authenticates with. Exactly one mode is active.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Static Basic Auth on every request.
    Basic(BasicAuth),
    /// Bearer token, optionally pre-supplied, refreshed from app credentials.
    Bearer {
        /// Credentials for the token exchange, if available.
        app: Option<AppCredentials>,
        /// A token supplied up front, used until it needs refreshing.
        access_token: Option<String>,
    },
}

impl Credentials {
    /// The authentication mode these credentials select.
    pub fn mode(&self) -> AuthMode {
        match self {
            Credentials::Basic(_) => AuthMode::Basic,
            Credentials::Bearer {
                access_token: Some(_),
                ..
            } => AuthMode::TokenOnly,
            Credentials::Bearer { .. } => AuthMode::AppCredentials,
        }
    }
}

/// Authentication mode, as reported in machine-readable output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// API user and password.
    Basic,
    /// A pre-supplied access token.
    TokenOnly,
    /// Token obtained by exchanging app id and secret.
    AppCredentials,
}

impl AuthMode {
    /// The mode name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Basic => "basic",
            AuthMode::TokenOnly => "token_only",
            AuthMode::AppCredentials => "app_credentials",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build a Basic Auth header value.
///
/// Encodes "user:secret" in Base64 and prepends "Basic ".
fn build_basic_header(user: &str, secret: &str) -> String {
    let credentials = format!("{}:{}", user, secret);
    let encoded = BASE64.encode(credentials.as_bytes());
    format!("Basic {}", encoded)
}

/// Build a Bearer header value.
pub fn bearer_header(token: &str) -> String {
    format!("Bearer {}", token)
}
