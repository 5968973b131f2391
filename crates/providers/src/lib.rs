//! Provider clients for vector stores and embedding services.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod openai;
pub mod qdrant;
pub mod weaviate;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Connection refused, DNS failure, timeout or a store that reports not-ready.
    #[error("endpoint unreachable: {0}")]
    Unreachable(String),
    #[error("request failed: {0}")]
    RequestFailed(String),
    #[error("graphql error: {0}")]
    GraphQl(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ProviderError::Unreachable(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            ProviderError::Unreachable(e.to_string())
        } else if e.is_decode() {
            ProviderError::Decode(e.to_string())
        } else {
            ProviderError::RequestFailed(e.to_string())
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub vectors: Vec<Vec<f32>>,
}

#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError>;
}

/// Turns a non-2xx response into `RequestFailed` carrying the status and body.
pub(crate) async fn ensure_success(
    resp: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.bytes().await.unwrap_or(Bytes::from_static(b""));
    Err(ProviderError::RequestFailed(format!(
        "status {} body {}",
        status,
        String::from_utf8_lossy(&body)
    )))
}

pub(crate) fn build_http_client(
    timeout: std::time::Duration,
) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .gzip(true)
        .build()
        .map_err(|e| ProviderError::RequestFailed(e.to_string()))
}
