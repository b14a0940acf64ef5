//! Read-model (subgraph) client
//!
//! Goals, messages, motivators and profiles are indexed by a GraphQL
//! subgraph. Only the read side uses this; the submission pipeline never does.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubgraphError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Response has no data")]
    NoData,
}

#[derive(Debug, Serialize)]
struct QueryBody<'a> {
    query: &'a str,
    variables: &'a Value,
}

#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct QueryResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

pub struct SubgraphClient {
    endpoint: String,
    http_client: reqwest::Client,
}

impl SubgraphClient {
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self, SubgraphError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SubgraphError::Request(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            http_client,
        })
    }

    /// Run a query and decode its `data` field
    pub async fn query<T: DeserializeOwned>(&self, query: &str, variables: &Value) -> Result<T, SubgraphError> {
        tracing::debug!("Subgraph query to {}", self.endpoint);

        let resp = self
            .http_client
            .post(&self.endpoint)
            .json(&QueryBody { query, variables })
            .send()
            .await
            .map_err(|e| SubgraphError::Request(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(SubgraphError::Request(format!("{}: {}", status, body)));
        }

        let reply: QueryResponse<T> = resp
            .json()
            .await
            .map_err(|e| SubgraphError::Request(format!("Failed to parse response: {}", e)))?;

        into_data(reply)
    }
}

fn into_data<T>(reply: QueryResponse<T>) -> Result<T, SubgraphError> {
    if !reply.errors.is_empty() {
        let messages: Vec<_> = reply.errors.into_iter().map(|e| e.message).collect();
        return Err(SubgraphError::Query(messages.join("; ")));
    }
    reply.data.ok_or(SubgraphError::NoData)
}
