//! HTTP transport for the TAPD API.
//!
//! A transport performs exactly one request and decodes the body as a JSON
//! object. Retry policy lives above this layer.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderName;
use reqwest::{Client, Method};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::error::{ApiError, Result};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Maximum number of body bytes quoted in decode errors.
const BODY_PREVIEW_LEN: usize = 200;

/// A decoded top-level JSON object.
pub type JsonObject = Map<String, Value>;

/// A fully-formed HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// The HTTP method.
    pub method: Method,
    /// The complete URL including any query string.
    pub url: String,
    /// Request headers.
    pub headers: Vec<(HeaderName, String)>,
    /// Optional request body.
    pub body: Option<String>,
}

impl HttpRequest {
    /// Create a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Create a POST request with a body.
    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body.into()),
        }
    }

    /// Add a header.
    pub fn header(mut self, name: HeaderName, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Look up a header value by name.
    #[cfg(test)]
    pub fn header_value(&self, name: &HeaderName) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Performs a single request and returns the decoded JSON object.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request.
    ///
    /// # Errors
    ///
    /// - `ApiError::Transport` on connection failure or timeout
    /// - `ApiError::HttpStatus` on a non-2xx response
    /// - `ApiError::Decode` if the body is not a JSON object
    async fn send(&self, request: HttpRequest) -> Result<JsonObject>;
}

/// The reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tapd-report/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Transport)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: HttpRequest) -> Result<JsonObject> {
        let mut builder = self.client.request(request.method, &request.url);
        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = %status, bytes = body.len(), "Received response");

        if !status.is_success() {
            return Err(ApiError::from_status(status, &body));
        }

        decode_object(&body)
    }
}

/// Decode a response body that must be a JSON object.
pub fn decode_object(body: &str) -> Result<JsonObject> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        ApiError::Decode(format!("response is not JSON ({}): {}", e, preview(body)))
    })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::Decode(format!(
            "expected a JSON object, got: {}",
            preview(&other.to_string())
        ))),
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(BODY_PREVIEW_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
