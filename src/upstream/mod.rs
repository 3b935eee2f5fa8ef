pub mod http;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

pub use http::HttpContentService;

/// Errors raised by the upstream content-service client. Handlers map every
/// variant to the generic 500 response; the variant detail is for logs.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned {status} for '{endpoint}'")]
    Status { status: u16, endpoint: String },

    #[error("invalid upstream URL: {0}")]
    InvalidUrl(String),
}

/// Contract with the upstream content service (headless CMS / e-commerce
/// backend). Payloads are schema-agnostic JSON; the gateway never interprets
/// them beyond the configured transform.
#[async_trait]
pub trait ContentService: Send + Sync {
    /// Fetch a collection, passing query parameters through unmodified.
    async fn list(
        &self,
        endpoint: &str,
        params: &HashMap<String, String>,
    ) -> Result<Value, UpstreamError>;

    /// Fetch a single item by id.
    async fn get(
        &self,
        endpoint: &str,
        id: &str,
        params: &HashMap<String, String>,
    ) -> Result<Value, UpstreamError>;

    /// Create an item from a JSON body.
    async fn create(&self, endpoint: &str, body: &Value) -> Result<Value, UpstreamError>;

    /// Update an existing item.
    async fn update(&self, endpoint: &str, id: &str, body: &Value)
        -> Result<Value, UpstreamError>;

    /// Delete an item. No body comes back.
    async fn delete(&self, endpoint: &str, id: &str) -> Result<(), UpstreamError>;
}
