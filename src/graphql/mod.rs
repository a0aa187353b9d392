pub mod decode;
pub mod value;

#[cfg(test)]
pub mod testing;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::app::{PageturnError, Result};

/// The one endpoint everything talks to.
pub const ENDPOINT: &str = "https://api.hardcover.app/v1/graphql";

/// Seam between the GraphQL client and the network, so tests can script
/// responses without a server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST one request body and return the parsed response JSON.
    async fn post(&self, body: Value) -> Result<Value>;
}

pub struct HttpTransport {
    client: Client,
    authorization: String,
}

impl HttpTransport {
    /// `authorization` is the full header value (`Bearer <token>`), already
    /// normalized by the config layer.
    pub fn new(authorization: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .user_agent("pageturn/0.1.0")
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            authorization,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, body: Value) -> Result<Value> {
        // Requests never go out unauthenticated; callers short-circuit
        // earlier, this is the backstop.
        if self.authorization.is_empty() {
            return Err(PageturnError::Unauthenticated);
        }
        let auth = HeaderValue::from_str(&self.authorization)
            .map_err(|_| PageturnError::Config("API key is not a valid header value".into()))?;

        let response = self
            .client
            .post(ENDPOINT)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, auth)
            .json(&body)
            .send()
            .await?;

        Ok(response.json().await?)
    }
}

/// Thin request/response layer over a [`Transport`]. A non-empty GraphQL
/// `errors` array is a failure even when the HTTP exchange succeeded;
/// callers above this layer decide whether that failure becomes an empty
/// result or propagates.
#[derive(Clone)]
pub struct GraphQLClient {
    transport: Arc<dyn Transport>,
}

impl GraphQLClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn execute(&self, query: &str, variables: Value) -> Result<Value> {
        let body = if variables.is_null() {
            json!({ "query": query })
        } else {
            json!({ "query": query, "variables": variables })
        };
        let response = self.transport.post(body).await?;
        split_response(response)
    }

    pub async fn execute_as<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let data = self.execute(query, variables).await?;
        Ok(serde_json::from_value(data)?)
    }
}

/// Separate the `data` payload from the `errors` array.
pub fn split_response(response: Value) -> Result<Value> {
    if let Some(errors) = response.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_string()
                })
                .collect();
            for message in &messages {
                tracing::warn!(%message, "GraphQL error");
            }
            return Err(PageturnError::GraphQL(messages));
        }
    }
    Ok(response.get("data").cloned().unwrap_or(Value::Null))
}
