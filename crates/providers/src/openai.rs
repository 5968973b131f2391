use crate::{build_http_client, ensure_success, EmbedResponse, EmbeddingProvider, ProviderError};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub embedding_model: String,
    pub timeout: Duration,
}

/// OpenAI-compatible `/v1/embeddings` client, used to vectorise search probes
/// for stores that cannot embed text themselves.
#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    cfg: Arc<OpenAiConfig>,
}

impl OpenAiProvider {
    pub fn new(cfg: OpenAiConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_http_client(cfg.timeout)?,
            cfg: Arc::new(cfg),
        })
    }
}

#[derive(Deserialize)]
struct EmbeddingApiResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[async_trait::async_trait]
impl EmbeddingProvider for OpenAiProvider {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        #[derive(serde::Serialize)]
        struct EmbedRequest<'a> {
            model: &'a str,
            input: &'a [String],
        }

        let body = EmbedRequest {
            model: &self.cfg.embedding_model,
            input: texts,
        };

        let resp = self
            .client
            .post(format!(
                "{}/v1/embeddings",
                self.cfg.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.cfg.api_key)
            .json(&body)
            .send()
            .await?;

        let parsed: EmbeddingApiResponse = ensure_success(resp).await?.json().await?;
        into_embeddings(parsed, texts.len())
    }
}

/// One vector per input text, or `Decode` when the service returned a
/// different number.
fn into_embeddings(
    parsed: EmbeddingApiResponse,
    expected: usize,
) -> Result<EmbedResponse, ProviderError> {
    if parsed.data.len() != expected {
        return Err(ProviderError::Decode(format!(
            "expected {} embeddings, got {}",
            expected,
            parsed.data.len()
        )));
    }
    Ok(EmbedResponse {
        vectors: parsed.data.into_iter().map(|d| d.embedding).collect(),
    })
}
