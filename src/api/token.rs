//! Access token lifecycle for the client-credentials grant.
//!
//! Tokens are held in memory only. A token with a known expiry is refreshed
//! once the clock is within [`REFRESH_MARGIN`] of it; a token without one is
//! kept until the gateway forces a refresh.

use std::fmt;
use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::auth::AppCredentials;
use super::error::{ApiError, Result};
use super::transport::{HttpRequest, JsonObject, Transport};

/// Path of the token endpoint, relative to the base URL.
pub const TOKEN_PATH: &str = "/tokens/request_token";

/// How long before expiry a token is considered stale.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(30);

const GRANT_BODY: &str = "grant_type=client_credentials";

/// A bearer token and its optional absolute expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    expires_at: Option<Instant>,
}

impl AccessToken {
    /// Create a token. `None` means no known expiry.
    pub fn new(value: impl Into<String>, expires_at: Option<Instant>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// The raw token value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The absolute expiry, if the service reported a lifetime.
    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    /// Whether the token must be refreshed at `now`.
    pub fn is_stale_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires_at) => now
                .checked_add(REFRESH_MARGIN)
                .map_or(true, |threshold| threshold >= expires_at),
            None => false,
        }
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Exchanges app credentials for tokens and caches the result.
#[derive(Debug)]
pub struct TokenManager {
    token_url: String,
    app: Option<AppCredentials>,
    token: Option<AccessToken>,
}

impl TokenManager {
    /// Create a manager for the service at `base_url`.
    ///
    /// A pre-supplied token is cached without expiry.
    pub fn new(base_url: &str, app: Option<AppCredentials>, access_token: Option<String>) -> Self {
        Self {
            token_url: format!("{}{}", base_url, TOKEN_PATH),
            app,
            token: access_token.map(|value| AccessToken::new(value, None)),
        }
    }

    /// The currently cached token, if any.
    pub fn current(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    /// Whether a new exchange is needed at `now`.
    pub fn needs_refresh_at(&self, now: Instant) -> bool {
        match &self.token {
            Some(token) => token.value.is_empty() || token.is_stale_at(now),
            None => true,
        }
    }

    /// Return a usable token, exchanging credentials first when required.
    pub async fn ensure_token<T>(&mut self, transport: &T, force_refresh: bool) -> Result<String>
    where
        T: Transport + ?Sized,
    {
        self.ensure_token_at(transport, force_refresh, Instant::now())
            .await
    }

    /// [`ensure_token`](Self::ensure_token) against an explicit clock reading.
    pub async fn ensure_token_at<T>(
        &mut self,
        transport: &T,
        force_refresh: bool,
        now: Instant,
    ) -> Result<String>
    where
        T: Transport + ?Sized,
    {
        if !force_refresh && !self.needs_refresh_at(now) {
            if let Some(token) = self.current() {
                return Ok(token.value().to_string());
            }
        }

        let token = self.exchange(transport, now).await?;
        Ok(token.value().to_string())
    }

    /// Perform the client-credentials grant and cache the new token.
    ///
    /// The reported lifetime is counted from `now`.
    ///
    /// # Errors
    ///
    /// - `ApiError::Config` if the app id or secret is missing
    /// - `ApiError::AuthExchange` if the service does not return a token
    /// - transport errors from the underlying request
    #[instrument(skip(self, transport, now), fields(token_url = %self.token_url))]
    pub async fn exchange<T>(&mut self, transport: &T, now: Instant) -> Result<&AccessToken>
    where
        T: Transport + ?Sized,
    {
        let app = self.app.as_ref().ok_or_else(|| {
            ApiError::Config(
                "TAPD_APP_ID/TAPD_APP_SECRET are required to obtain an access token".to_string(),
            )
        })?;
        if app.app_id.is_empty() || app.app_secret.is_empty() {
            return Err(ApiError::Config(
                "TAPD_APP_ID/TAPD_APP_SECRET are required to obtain an access token".to_string(),
            ));
        }

        debug!(app_id = %app.app_id, "Requesting access token");
        let request = HttpRequest::post(&self.token_url, GRANT_BODY)
            .header(AUTHORIZATION, app.header_value())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(ACCEPT, "application/json");
        let payload = transport.send(request).await?;

        let token = parse_token_payload(&payload, now)?;
        info!(
            has_expiry = token.expires_at().is_some(),
            "Obtained access token"
        );
        Ok(self.token.insert(token))
    }
}

/// Turn a token endpoint payload into an [`AccessToken`].
fn parse_token_payload(payload: &JsonObject, now: Instant) -> Result<AccessToken> {
    if payload.get("status").and_then(Value::as_i64) != Some(1) {
        return Err(ApiError::AuthExchange(format!(
            "info={}",
            info_text(payload)
        )));
    }

    let data = payload.get("data").and_then(Value::as_object);
    let value = data
        .and_then(|d| d.get("access_token"))
        .and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ApiError::AuthExchange(format!(
                "no access_token returned, data={}",
                payload.get("data").unwrap_or(&Value::Null)
            ))
        })?;

    let lifetime = data.and_then(|d| d.get("expires_in")).and_then(lifetime_secs);
    // A lifetime past the clock's range is treated as no known expiry.
    let expires_at = lifetime.and_then(|secs| now.checked_add(Duration::from_secs(secs)));

    Ok(AccessToken::new(value, expires_at))
}

/// A strictly positive lifetime in seconds, from a number or numeric string.
fn lifetime_secs(value: &Value) -> Option<u64> {
    let secs = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    u64::try_from(secs).ok().filter(|s| *s > 0)
}

/// The service's `info` field as text.
pub(crate) fn info_text(payload: &JsonObject) -> String {
    match payload.get("info") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
