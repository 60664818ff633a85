//! Engine transport and tenant registry
//!
//! Resolves client names to engine endpoints and talks to the engine's admin
//! and schema APIs over blocking HTTP.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::{SchemaEngine, SchemaResource};
use crate::config::EngineConfig;
use crate::error::{Result, SchemaError};

/// Host and port of an engine instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    /// URL scheme, "http" unless configured otherwise
    #[serde(default = "default_scheme")]
    pub scheme: String,
}

fn default_scheme() -> String {
    "http".to_string()
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            scheme: default_scheme(),
        }
    }

    /// Root URL of the engine's HTTP API (e.g., "http://10.0.0.12:8983/solr")
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}/solr", self.scheme, self.host, self.port)
    }

    pub fn core_status_url(&self) -> String {
        format!("{}/admin/cores?action=STATUS", self.base_url())
    }

    pub fn schema_url(&self, collection: &str) -> String {
        format!("{}/{}/schema", self.base_url(), collection)
    }

    pub fn schema_resource_url(&self, collection: &str, resource: SchemaResource) -> String {
        format!("{}/{}", self.schema_url(collection), resource.path())
    }
}

/// Tenant registry mapping client names to endpoints
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    clients: HashMap<String, Endpoint>,
}

impl ClientRegistry {
    pub fn new(clients: HashMap<String, Endpoint>) -> Self {
        Self { clients }
    }

    /// Register or replace a client
    pub fn insert(&mut self, name: impl Into<String>, endpoint: Endpoint) {
        self.clients.insert(name.into(), endpoint);
    }

    /// Resolve a client name to its endpoint
    pub fn resolve(&self, client: &str) -> Result<&Endpoint> {
        self.clients
            .get(client)
            .ok_or_else(|| SchemaError::ClientNotFound(client.to_string()))
    }

    /// All registered client names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.clients.keys().map(String::as_str).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Blocking HTTP transport to a Solr-compatible engine
pub struct SolrHttpEngine {
    client: reqwest::blocking::Client,
}

impl SolrHttpEngine {
    /// Build the transport with the configured timeout and user agent
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SchemaError::SchemaUnreachable {
                url: String::new(),
                reason: format!("http client: {e}"),
            })?;
        Ok(Self { client })
    }

    fn get_json(&self, url: &str, collection: Option<&str>) -> Result<serde_json::Value> {
        debug!(url, "GET");
        let resp = self.client.get(url).send().map_err(|e| unreachable(url, e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            if let Some(collection) = collection {
                return Err(SchemaError::CollectionNotFound {
                    collection: collection.to_string(),
                });
            }
        }
        if !status.is_success() {
            return Err(SchemaError::SchemaUnreachable {
                url: url.to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        resp.json().map_err(|e| unreachable(url, e))
    }
}

fn unreachable(url: &str, e: reqwest::Error) -> SchemaError {
    SchemaError::SchemaUnreachable {
        url: url.to_string(),
        reason: e.to_string(),
    }
}

/// Error details the schema API reports inside a response body
fn schema_api_errors(body: &serde_json::Value) -> Option<String> {
    let errors = body.get("errors").and_then(|e| e.as_array())?;
    if errors.is_empty() {
        return None;
    }
    Some(
        errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; "),
    )
}

impl SchemaEngine for SolrHttpEngine {
    fn core_status(&self, endpoint: &Endpoint) -> Result<serde_json::Value> {
        self.get_json(&endpoint.core_status_url(), None)
    }

    fn fetch_schema(
        &self,
        endpoint: &Endpoint,
        collection: &str,
        resource: SchemaResource,
    ) -> Result<serde_json::Value> {
        self.get_json(&endpoint.schema_resource_url(collection, resource), Some(collection))
    }

    fn post_schema(&self, endpoint: &Endpoint, collection: &str, body: &serde_json::Value) -> Result<()> {
        let url = endpoint.schema_url(collection);
        debug!(url = %url, "POST");
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .map_err(|e| unreachable(&url, e))?;

        let status = resp.status();
        let text = resp.text().map_err(|e| unreachable(&url, e))?;
        let parsed: Option<serde_json::Value> = serde_json::from_str(&text).ok();

        let detail = if !status.is_success() {
            Some(
                parsed
                    .as_ref()
                    .and_then(schema_api_errors)
                    .unwrap_or_else(|| format!("HTTP {status}: {text}")),
            )
        } else {
            parsed.as_ref().and_then(schema_api_errors)
        };

        if let Some(detail) = detail {
            warn!(collection, %detail, "Schema mutation rejected");
            return Err(SchemaError::MutationRejected {
                collection: collection.to_string(),
                detail,
            });
        }
        Ok(())
    }
}
