//! Scripted mock transport
//!
//! Responses are keyed by `"METHOD path"`. Each key holds a queue: queued
//! responses are consumed in order and the last one repeats, so a poll
//! endpoint can be scripted as `running, running, completed` or pinned to
//! `running` forever with a single entry. Unscripted requests answer 404.
//!
//! Every request is also appended to a journal so tests can assert on call
//! order, e.g. that compensating deletes happen in reverse creation order.

use crate::errors::HttpError;
use crate::transport::ApiTransport;
use crate::types::{ApiResponse, HttpMethod};
use serde_json::{json, Value as JsonValue};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// One scripted response
#[derive(Debug, Clone)]
struct ScriptedResponse {
    status: u16,
    body: JsonValue,
}

/// A request the mock has served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: HttpMethod,
    pub path: String,
}

/// In-memory transport for tests
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<String, VecDeque<ScriptedResponse>>>,
    journal: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `METHOD path`
    pub fn respond(&self, method: HttpMethod, path: &str, status: u16, body: JsonValue) {
        let key = format!("{} {}", method, path);
        self.responses
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .push_back(ScriptedResponse { status, body });
    }

    /// All requests served so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.journal.lock().unwrap().clone()
    }

    /// Requests served so far filtered by method, in order
    pub fn requests_with_method(&self, method: HttpMethod) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    /// Number of requests matching method and path
    pub fn count(&self, method: HttpMethod, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    fn next_response(&self, key: &str) -> Option<ScriptedResponse> {
        let mut responses = self.responses.lock().unwrap();
        let queue = responses.get_mut(key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait::async_trait]
impl ApiTransport for MockTransport {
    async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        _body: Option<&JsonValue>,
        _token: Option<&str>,
    ) -> Result<ApiResponse, HttpError> {
        // The client hands over absolute URLs; the script keys on the path.
        let path = url::Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| url.to_string());

        self.journal.lock().unwrap().push(RecordedRequest {
            method,
            path: path.clone(),
        });

        let key = format!("{} {}", method, path);
        match self.next_response(&key) {
            Some(scripted) => Ok(ApiResponse::new(scripted.status, scripted.body)),
            None => Ok(ApiResponse::new(404, json!({"error": "not found"}))),
        }
    }
}
