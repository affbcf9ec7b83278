//! TAPD API response types.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use super::error::{ApiError, Result};

/// Work item types that can be counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Requirements.
    Stories,
    /// Defects.
    Bugs,
    /// Tasks.
    Tasks,
}

impl Resource {
    /// All countable resources, in report order.
    pub const ALL: [Resource; 3] = [Resource::Stories, Resource::Bugs, Resource::Tasks];

    /// The resource name used in endpoint paths.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Stories => "stories",
            Resource::Bugs => "bugs",
            Resource::Tasks => "tasks",
        }
    }

    /// The path of this resource's count endpoint.
    pub fn count_path(&self) -> String {
        format!("/{}/count", self.as_str())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Work item totals for a workspace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    /// Number of stories.
    pub stories: u64,
    /// Number of bugs.
    pub bugs: u64,
    /// Number of tasks.
    pub tasks: u64,
}

impl Counts {
    /// Store a count for `resource`.
    pub fn set(&mut self, resource: Resource, count: u64) {
        match resource {
            Resource::Stories => self.stories = count,
            Resource::Bugs => self.bugs = count,
            Resource::Tasks => self.tasks = count,
        }
    }
}

/// Fields requested from the iterations endpoint.
pub const ITERATION_FIELDS: &str = "id,name,status,startdate,enddate";

/// An iteration (sprint).
///
/// Serializes as the flat record returned by the API.
#[derive(Debug, Clone, PartialEq)]
pub struct Iteration {
    /// Iteration id.
    pub id: Option<String>,
    /// Iteration name.
    pub name: Option<String>,
    /// Status, e.g. `open` or `done`.
    pub status: Option<String>,
    /// Start date as reported by the API.
    pub start_date: Option<String>,
    /// End date as reported by the API.
    pub end_date: Option<String>,
    raw: Map<String, Value>,
}

impl Iteration {
    /// Normalize one row of the iterations list.
    ///
    /// Rows are usually wrapped as `{"Iteration": {...}}`; a single-key object
    /// whose value is an object is unwrapped, any other object is taken as the
    /// record itself.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Decode` if the row is not a JSON object.
    pub fn from_row(row: Value) -> Result<Self> {
        let record = match row {
            Value::Object(map) => unwrap_envelope(map),
            other => {
                return Err(ApiError::Decode(format!(
                    "iteration row is not an object: {}",
                    other
                )))
            }
        };

        Ok(Self {
            id: text_field(&record, "id"),
            name: text_field(&record, "name"),
            status: text_field(&record, "status"),
            start_date: text_field(&record, "startdate"),
            end_date: text_field(&record, "enddate"),
            raw: record,
        })
    }
}

impl Serialize for Iteration {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

fn unwrap_envelope(map: Map<String, Value>) -> Map<String, Value> {
    if map.len() != 1 || !map.values().all(Value::is_object) {
        return map;
    }
    match map.into_iter().next() {
        Some((_, Value::Object(inner))) => inner,
        _ => Map::new(),
    }
}

fn text_field(record: &Map<String, Value>, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Extract `data.count` from a count payload.
///
/// A missing or null count is 0; numeric strings are accepted.
///
/// # Errors
///
/// Returns `ApiError::Decode` for negative or non-numeric counts.
pub fn extract_count(payload: &Map<String, Value>) -> Result<u64> {
    let count = payload
        .get("data")
        .and_then(Value::as_object)
        .and_then(|data| data.get("count"));

    match count {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .ok_or_else(|| ApiError::Decode(format!("invalid count: {}", n))),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map_err(|_| ApiError::Decode(format!("invalid count: {:?}", s))),
        Some(other) => Err(ApiError::Decode(format!("invalid count: {}", other))),
    }
}
