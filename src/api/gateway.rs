//! Read-only access to the TAPD API.
//!
//! Every business request goes through [`ReadOnlyGateway::request_readonly`],
//! which only permits GET requests against a fixed allow-list of endpoints.

use std::fmt;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::auth::{bearer_header, AuthMode, BasicAuth, Credentials};
use super::error::{ApiError, Result};
use super::token::{info_text, TokenManager};
use super::transport::{HttpRequest, JsonObject, Transport};

/// The endpoints a gateway may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET /stories/count`
    StoriesCount,
    /// `GET /bugs/count`
    BugsCount,
    /// `GET /tasks/count`
    TasksCount,
    /// `GET /iterations`
    Iterations,
}

impl Endpoint {
    /// All allow-listed endpoints.
    pub const ALL: [Endpoint; 4] = [
        Endpoint::StoriesCount,
        Endpoint::BugsCount,
        Endpoint::TasksCount,
        Endpoint::Iterations,
    ];

    /// The endpoint path, relative to the base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::StoriesCount => "/stories/count",
            Endpoint::BugsCount => "/bugs/count",
            Endpoint::TasksCount => "/tasks/count",
            Endpoint::Iterations => "/iterations",
        }
    }

    /// Resolve a path against the allow-list.
    pub fn from_path(path: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.path() == path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A query parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// A single value.
    One(String),
    /// Several values, encoded as repeated keys.
    Many(Vec<String>),
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::One(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::One(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::One(value.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::Many(values)
    }
}

/// Ordered query parameters.
pub type Params = Vec<(&'static str, ParamValue)>;

/// URL-encode query parameters, repeating keys for multi-valued parameters.
pub fn encode_query(params: &[(&str, ParamValue)]) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        let key = urlencoding::encode(key);
        match value {
            ParamValue::One(v) => pairs.push(format!("{}={}", key, urlencoding::encode(v))),
            ParamValue::Many(vs) => {
                for v in vs {
                    pairs.push(format!("{}={}", key, urlencoding::encode(v)));
                }
            }
        }
    }
    pairs.join("&")
}

/// How the gateway authenticates.
#[derive(Debug)]
enum Authenticator {
    Basic(BasicAuth),
    Bearer(TokenManager),
}

/// Enforces the read-only allow-list and attaches credentials.
#[derive(Debug)]
pub struct ReadOnlyGateway<T: Transport> {
    transport: T,
    base_url: String,
    auth: Authenticator,
    mode: AuthMode,
}

impl<T: Transport> ReadOnlyGateway<T> {
    /// Create a gateway for `base_url` (without trailing slash).
    pub fn new(transport: T, base_url: &str, credentials: Credentials) -> Self {
        let mode = credentials.mode();
        let auth = match credentials {
            Credentials::Basic(basic) => Authenticator::Basic(basic),
            Credentials::Bearer { app, access_token } => {
                Authenticator::Bearer(TokenManager::new(base_url, app, access_token))
            }
        };
        Self {
            transport,
            base_url: base_url.to_string(),
            auth,
            mode,
        }
    }

    /// The active authentication mode.
    pub fn auth_mode(&self) -> AuthMode {
        self.mode
    }

    /// The underlying transport.
    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Issue a GET against an allow-listed path.
    ///
    /// When the service reports a failure that looks like an expired or
    /// invalid token and `allow_retry` is set, the token is refreshed and the
    /// request is sent once more.
    ///
    /// # Errors
    ///
    /// - `ApiError::PolicyViolation` if `path` is not allow-listed; nothing is sent
    /// - `ApiError::Api` if the service reports a failure
    /// - token exchange and transport errors
    #[instrument(skip(self, params))]
    pub async fn request_readonly(
        &mut self,
        path: &str,
        params: &[(&str, ParamValue)],
        allow_retry: bool,
    ) -> Result<JsonObject> {
        let endpoint = Endpoint::from_path(path)
            .ok_or_else(|| ApiError::PolicyViolation(path.to_string()))?;

        let payload = self.send_once(endpoint, params, false).await?;
        if is_success(&payload) {
            return Ok(payload);
        }

        let info = info_text(&payload);
        let can_refresh = matches!(self.auth, Authenticator::Bearer(_));
        if !(allow_retry && can_refresh && ApiError::is_suspected_auth_failure(&info)) {
            return Err(ApiError::Api {
                path: path.to_string(),
                info,
            });
        }

        warn!(info = %info, "Request failed with suspected auth error, refreshing token");
        let payload = self.send_once(endpoint, params, true).await?;
        if is_success(&payload) {
            return Ok(payload);
        }

        Err(ApiError::Api {
            path: path.to_string(),
            info: info_text(&payload),
        })
    }

    /// Send one request, refreshing the token first when `force_refresh` is set.
    async fn send_once(
        &mut self,
        endpoint: Endpoint,
        params: &[(&str, ParamValue)],
        force_refresh: bool,
    ) -> Result<JsonObject> {
        let authorization = match &mut self.auth {
            Authenticator::Basic(basic) => basic.header_value().to_string(),
            Authenticator::Bearer(tokens) => {
                let token = tokens.ensure_token(&self.transport, force_refresh).await?;
                bearer_header(&token)
            }
        };

        let query = encode_query(params);
        let url = if query.is_empty() {
            format!("{}{}", self.base_url, endpoint.path())
        } else {
            format!("{}{}?{}", self.base_url, endpoint.path(), query)
        };
        debug!(endpoint = %endpoint, "Sending read-only request");

        let request = HttpRequest::get(url)
            .header(AUTHORIZATION, authorization)
            .header(ACCEPT, "application/json");
        self.transport.send(request).await
    }
}

/// Whether a payload carries the success discriminator `status == 1`.
fn is_success(payload: &JsonObject) -> bool {
    payload.get("status").and_then(Value::as_i64) == Some(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::auth::AppCredentials;
    use crate::api::testing::{fail, ok, token, ScriptedTransport};
    use serde_json::json;

    fn bearer_gateway() -> ReadOnlyGateway<ScriptedTransport> {
        ReadOnlyGateway::new(
            ScriptedTransport::new(),
            "https://api.example.com",
            Credentials::Bearer {
                app: Some(AppCredentials::new("app", "secret")),
                access_token: None,
            },
        )
    }

    fn workspace() -> Params {
        vec![("workspace_id", ParamValue::from("42"))]
    }

    #[test]
    fn test_endpoint_allow_list() {
        assert_eq!(
            Endpoint::from_path("/stories/count"),
            Some(Endpoint::StoriesCount)
        );
        assert_eq!(Endpoint::from_path("/iterations"), Some(Endpoint::Iterations));
        assert_eq!(Endpoint::from_path("/stories"), None);
        assert_eq!(Endpoint::from_path("/iterations/"), None);
        assert_eq!(Endpoint::from_path("/tokens/request_token"), None);
    }

    #[test]
    fn test_encode_query_repeats_multi_valued_keys() {
        let params = vec![
            ("workspace_id", ParamValue::from("42")),
            (
                "status",
                ParamValue::from(vec!["open".to_string(), "done".to_string()]),
            ),
            ("fields", ParamValue::from("id,name")),
        ];
        assert_eq!(
            encode_query(&params),
            "workspace_id=42&status=open&status=done&fields=id%2Cname"
        );
    }

    #[test]
    fn test_encode_query_escapes_values() {
        let params = vec![("name", ParamValue::from("迭代 1&2"))];
        assert_eq!(encode_query(&params), "name=%E8%BF%AD%E4%BB%A3%201%262");
        assert_eq!(encode_query(&[]), "");
    }

    #[tokio::test]
    async fn test_policy_violation_before_network() {
        let mut gateway = bearer_gateway();

        for path in ["/stories", "/bugs/delete", "/tokens/request_token", ""] {
            let err = gateway
                .request_readonly(path, &workspace(), true)
                .await
                .unwrap_err();
            assert!(matches!(err, ApiError::PolicyViolation(p) if p == path));
        }
        assert_eq!(gateway.transport().request_count(), 0);
    }

    #[tokio::test]
    async fn test_bearer_request_shape() {
        let mut gateway = bearer_gateway();
        gateway.transport().push_json(token("tok", 3600));
        gateway.transport().push_json(ok(json!({ "count": 3 })));

        let payload = gateway
            .request_readonly("/bugs/count", &workspace(), true)
            .await
            .unwrap();

        assert_eq!(payload["data"]["count"], json!(3));
        let requests = gateway.transport().requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].url.ends_with("/tokens/request_token"));
        assert_eq!(requests[1].method, reqwest::Method::GET);
        assert_eq!(
            requests[1].url,
            "https://api.example.com/bugs/count?workspace_id=42"
        );
        assert_eq!(requests[1].header_value(&AUTHORIZATION), Some("Bearer tok"));
        assert_eq!(
            requests[1].header_value(&ACCEPT),
            Some("application/json")
        );
    }

    #[tokio::test]
    async fn test_basic_request_shape() {
        let mut gateway = ReadOnlyGateway::new(
            ScriptedTransport::new(),
            "https://api.example.com",
            Credentials::Basic(BasicAuth::new("u", "p")),
        );
        gateway.transport().push_json(ok(json!({ "count": 1 })));

        gateway
            .request_readonly("/tasks/count", &workspace(), true)
            .await
            .unwrap();

        let requests = gateway.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].header_value(&AUTHORIZATION), Some("Basic dTpw"));
        assert_eq!(gateway.auth_mode(), AuthMode::Basic);
    }

    #[tokio::test]
    async fn test_token_expired_triggers_single_refresh_and_retry() {
        let mut gateway = bearer_gateway();
        gateway.transport().push_json(token("old", 3600));
        gateway.transport().push_json(fail("Token Expired"));
        gateway.transport().push_json(token("new", 3600));
        gateway.transport().push_json(ok(json!({ "count": 9 })));

        let payload = gateway
            .request_readonly("/stories/count", &workspace(), true)
            .await
            .unwrap();

        assert_eq!(payload["data"]["count"], json!(9));
        let transport = gateway.transport();
        assert_eq!(transport.count_matching("/tokens/request_token"), 2);
        assert_eq!(transport.count_matching("/stories/count"), 2);
        let requests = transport.requests();
        assert_eq!(requests[3].header_value(&AUTHORIZATION), Some("Bearer new"));
    }

    #[tokio::test]
    async fn test_expired_supplied_token_replaced_from_app_credentials() {
        let mut gateway = ReadOnlyGateway::new(
            ScriptedTransport::new(),
            "https://api.example.com",
            Credentials::Bearer {
                app: Some(AppCredentials::new("app", "secret")),
                access_token: Some("supplied".to_string()),
            },
        );
        gateway.transport().push_json(fail("token expired"));
        gateway.transport().push_json(token("fresh", 3600));
        gateway.transport().push_json(ok(json!({ "count": 4 })));

        let payload = gateway
            .request_readonly("/tasks/count", &workspace(), true)
            .await
            .unwrap();

        assert_eq!(payload["data"]["count"], json!(4));
        assert_eq!(gateway.auth_mode(), AuthMode::TokenOnly);
        let transport = gateway.transport();
        assert_eq!(transport.count_matching("/tokens/request_token"), 1);
        assert_eq!(transport.count_matching("/tasks/count"), 2);
        let requests = transport.requests();
        assert_eq!(requests[0].header_value(&AUTHORIZATION), Some("Bearer supplied"));
        assert!(requests[1].url.ends_with("/tokens/request_token"));
        assert_eq!(
            requests[1].header_value(&AUTHORIZATION),
            Some("Basic YXBwOnNlY3JldA==")
        );
        assert_eq!(requests[2].header_value(&AUTHORIZATION), Some("Bearer fresh"));
    }

    #[tokio::test]
    async fn test_retry_happens_at_most_once() {
        let mut gateway = bearer_gateway();
        gateway.transport().push_json(token("old", 3600));
        gateway.transport().push_json(fail("token expired"));
        gateway.transport().push_json(token("new", 3600));
        gateway.transport().push_json(fail("token expired"));

        let err = gateway
            .request_readonly("/stories/count", &workspace(), true)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Api { ref info, .. } if info == "token expired"));
        assert_eq!(gateway.transport().count_matching("/stories/count"), 2);
        assert_eq!(gateway.transport().request_count(), 4);
    }

    #[tokio::test]
    async fn test_permission_denied_fails_without_retry() {
        let mut gateway = bearer_gateway();
        gateway.transport().push_json(token("tok", 3600));
        gateway.transport().push_json(fail("permission denied"));

        let err = gateway
            .request_readonly("/bugs/count", &workspace(), true)
            .await
            .unwrap_err();

        match err {
            ApiError::Api { path, info } => {
                assert_eq!(path, "/bugs/count");
                assert_eq!(info, "permission denied");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
        assert_eq!(gateway.transport().count_matching("/tokens/request_token"), 1);
        assert_eq!(gateway.transport().count_matching("/bugs/count"), 1);
    }

    #[tokio::test]
    async fn test_no_retry_when_disallowed() {
        let mut gateway = bearer_gateway();
        gateway.transport().push_json(token("tok", 3600));
        gateway.transport().push_json(fail("invalid token"));

        let err = gateway
            .request_readonly("/bugs/count", &workspace(), false)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Api { .. }));
        assert_eq!(gateway.transport().request_count(), 2);
    }

    #[tokio::test]
    async fn test_basic_mode_does_not_retry() {
        let mut gateway = ReadOnlyGateway::new(
            ScriptedTransport::new(),
            "https://api.example.com",
            Credentials::Basic(BasicAuth::new("u", "p")),
        );
        gateway.transport().push_json(fail("invalid user"));

        let err = gateway
            .request_readonly("/bugs/count", &workspace(), true)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Api { .. }));
        assert_eq!(gateway.transport().request_count(), 1);
    }

    #[tokio::test]
    async fn test_transport_error_is_not_retried() {
        let mut gateway = bearer_gateway();
        gateway.transport().push_json(token("tok", 3600));
        gateway.transport().push_error(ApiError::from_status(
            reqwest::StatusCode::UNAUTHORIZED,
            "expired token",
        ));

        let err = gateway
            .request_readonly("/bugs/count", &workspace(), true)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::HttpStatus { .. }));
        assert_eq!(gateway.transport().request_count(), 2);
    }
}
