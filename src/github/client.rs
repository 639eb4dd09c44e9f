//! Remote query client.
//!
//! Knows the request/response envelopes of the GraphQL and REST endpoints
//! and nothing about what is being asked for. No retries happen here.

use crate::error::ApiError;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, LINK};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Default `Accept` value for REST calls.
pub const REST_ACCEPT: &str = "application/vnd.github+json";

const API_VERSION: &str = "2022-11-28";
const CLIENT_USER_AGENT: &str = concat!("ghrecap/", env!("CARGO_PKG_VERSION"));

/// Settings needed to build a [`GitHubClient`].
#[derive(Clone)]
pub struct ClientConfig {
    /// Opaque bearer token.
    pub token: String,
    /// REST base URL, e.g. `https://api.github.com`.
    pub api_base: String,
    /// Full GraphQL endpoint URL.
    pub graphql_endpoint: String,
    pub timeout_seconds: u64,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_base", &self.api_base)
            .field("graphql_endpoint", &self.graphql_endpoint)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish_non_exhaustive()
    }
}

/// GraphQL request body.
#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: &'a Value,
}

/// GraphQL response body: either `data` or a list of `errors`.
#[derive(Debug, Deserialize)]
struct GraphQlEnvelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphQlMessage {
    message: String,
}

/// One page of a REST listing.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Whether the `Link` header advertised a next page.
    pub has_next: bool,
}

/// Client for the remote service. Construct one per run and pass it by reference.
pub struct GitHubClient {
    http: reqwest::Client,
    token: String,
    api_base: String,
    graphql_endpoint: String,
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_base", &self.api_base)
            .field("graphql_endpoint", &self.graphql_endpoint)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Create a new client. Every request is bounded by the configured timeout.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(CLIENT_USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            token: config.token,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            graphql_endpoint: config.graphql_endpoint,
        })
    }

    /// Run a GraphQL query and decode its `data` payload into `T`.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: &Value,
    ) -> Result<T, ApiError> {
        debug!("POST {}", self.graphql_endpoint);

        let response = self
            .http
            .post(&self.graphql_endpoint)
            .header(AUTHORIZATION, format!("bearer {}", self.token))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&GraphQlRequest { query, variables })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Transport { status, body });
        }

        let envelope: GraphQlEnvelope =
            serde_json::from_str(&body).map_err(|e| ApiError::decode("graphql envelope", e))?;

        let mut errors = envelope.errors.into_iter();
        if let Some(first) = errors.next() {
            let rest: Vec<String> = errors.map(|e| e.message).collect();
            for message in &rest {
                warn!("Additional GraphQL error: {}", message);
            }
            return Err(ApiError::Query {
                message: first.message,
                additional: rest.len(),
            });
        }

        serde_json::from_value(envelope.data.unwrap_or(Value::Null))
            .map_err(|e| ApiError::decode("graphql data", e))
    }

    /// Fetch one page of a REST listing at `path` (relative to the API base).
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        accept: &str,
    ) -> Result<Page<T>, ApiError> {
        let url = format!("{}{}", self.api_base, path);
        debug!("GET {} {:?}", url, query);

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, accept)
            .header("X-GitHub-Api-Version", API_VERSION)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let has_next = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .is_some_and(has_next_link);
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Transport { status, body });
        }

        let items = serde_json::from_str(&body).map_err(|e| ApiError::decode("rest page", e))?;
        Ok(Page { items, has_next })
    }

    /// Fetch a single REST object at `path`.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.api_base, path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, REST_ACCEPT)
            .header("X-GitHub-Api-Version", API_VERSION)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Transport { status, body });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::decode("rest object", e))
    }
}

/// Returns true if a `Link` header value contains a `rel="next"` entry.
fn has_next_link(value: &str) -> bool {
    value.split(',').any(|link| {
        link.split(';')
            .skip(1)
            .any(|param| param.trim() == "rel=\"next\"")
    })
}
