use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::Transport;
use crate::app::Result;

/// Transport fake for tests: responses are keyed by a substring of the
/// query text, checked in registration order. Unmatched queries get an
/// empty `data` payload. Every request body is recorded for assertions.
#[derive(Default)]
pub struct ScriptedTransport {
    rules: Vec<(String, Value)>,
    requests: Mutex<Vec<Value>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, query_substring: &str, response: Value) -> Self {
        self.rules.push((query_substring.to_string(), response));
        self
    }

    pub fn sent(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    /// Queries (in order) that matched a given substring.
    pub fn sent_matching(&self, query_substring: &str) -> Vec<Value> {
        self.sent()
            .into_iter()
            .filter(|body| {
                body["query"]
                    .as_str()
                    .is_some_and(|q| q.contains(query_substring))
            })
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, body: Value) -> Result<Value> {
        self.requests.lock().unwrap().push(body.clone());
        let query = body["query"].as_str().unwrap_or("");
        for (needle, response) in &self.rules {
            if query.contains(needle.as_str()) {
                return Ok(response.clone());
            }
        }
        Ok(json!({ "data": null }))
    }
}
