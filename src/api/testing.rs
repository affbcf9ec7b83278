//! Scripted in-memory transport for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::error::{ApiError, Result};
use super::transport::{HttpRequest, JsonObject, Transport};

/// Replays queued responses in order and records every request it receives.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<JsonObject>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a JSON payload. Panics if `value` is not an object.
    pub fn push_json(&self, value: Value) -> &Self {
        let map = match value {
            Value::Object(map) => map,
            other => panic!("scripted payload must be an object, got {}", other),
        };
        self.responses.lock().unwrap().push_back(Ok(map));
        self
    }

    pub fn push_error(&self, err: ApiError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Number of recorded requests whose URL contains `fragment`.
    pub fn count_matching(&self, fragment: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.contains(fragment))
            .count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<JsonObject> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no scripted response for {}", request.url))
    }
}

/// A successful payload wrapping `data`.
pub fn ok(data: Value) -> Value {
    serde_json::json!({ "status": 1, "data": data, "info": "success" })
}

/// A failed payload carrying `info`.
pub fn fail(info: &str) -> Value {
    serde_json::json!({ "status": 0, "info": info })
}

/// A successful token exchange payload.
pub fn token(value: &str, expires_in: i64) -> Value {
    ok(serde_json::json!({ "access_token": value, "expires_in": expires_in }))
}
