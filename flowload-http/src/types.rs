//! HTTP types shared across the client and the engine

use serde_json::Value as JsonValue;
use std::fmt;

/// HTTP methods used against the orchestration API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Get the string representation of the HTTP method
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Status code and parsed JSON body of one API response
///
/// Non-JSON bodies (204s, proxy error pages) are represented as `Null`
/// rather than failing the call; the engine cares about status codes and a
/// handful of well-known fields only.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: JsonValue,
}

impl ApiResponse {
    pub fn new(status: u16, body: JsonValue) -> Self {
        Self { status, body }
    }

    /// The `id` field, accepting both string and numeric ids
    pub fn id(&self) -> Option<String> {
        match self.body.get("id") {
            Some(JsonValue::String(s)) => Some(s.clone()),
            Some(JsonValue::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// The remote `status` field, e.g. "running" or "completed"
    pub fn status_field(&self) -> Option<&str> {
        self.body.get("status").and_then(|v| v.as_str())
    }

    /// The `execution_id` field returned by async trigger endpoints
    pub fn execution_id(&self) -> Option<String> {
        match self.body.get("execution_id") {
            Some(JsonValue::String(s)) => Some(s.clone()),
            Some(JsonValue::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// The `records_processed` field reported by completed executions
    pub fn records_processed(&self) -> Option<u64> {
        self.body.get("records_processed").and_then(|v| v.as_u64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_accepts_string_and_number() {
        assert_eq!(
            ApiResponse::new(200, json!({"id": "abc"})).id(),
            Some("abc".to_string())
        );
        assert_eq!(
            ApiResponse::new(200, json!({"id": 42})).id(),
            Some("42".to_string())
        );
        assert_eq!(ApiResponse::new(204, JsonValue::Null).id(), None);
    }

    #[test]
    fn test_well_known_fields() {
        let response = ApiResponse::new(
            200,
            json!({"status": "completed", "execution_id": "e-1", "records_processed": 1500}),
        );
        assert_eq!(response.status_field(), Some("completed"));
        assert_eq!(response.execution_id(), Some("e-1".to_string()));
        assert_eq!(response.records_processed(), Some(1500));
    }
}
