use crate::{build_http_client, ensure_success, ProviderError};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct QdrantClient {
    client: Client,
    cfg: QdrantConfig,
}

impl QdrantClient {
    pub fn new(cfg: QdrantConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_http_client(cfg.timeout)?,
            cfg,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.cfg.url.trim_end_matches('/'), path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.cfg.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }

    pub async fn is_ready(&self) -> Result<bool, ProviderError> {
        let resp = self
            .authorize(self.client.get(self.endpoint("/readyz")))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    pub async fn list_collections(&self) -> Result<Vec<String>, ProviderError> {
        let resp = self
            .authorize(self.client.get(self.endpoint("/collections")))
            .send()
            .await?;
        let parsed: QdrantResponse<CollectionsResult> = ensure_success(resp).await?.json().await?;
        Ok(parsed.result.collections.into_iter().map(|c| c.name).collect())
    }

    pub async fn count(&self, collection: &str) -> Result<u64, ProviderError> {
        #[derive(Serialize)]
        struct CountRequest {
            exact: bool,
        }
        let url = self.endpoint(&format!("/collections/{}/points/count", collection));
        let resp = self
            .authorize(self.client.post(url).json(&CountRequest { exact: true }))
            .send()
            .await?;
        let parsed: QdrantResponse<CountResult> = ensure_success(resp).await?.json().await?;
        Ok(parsed.result.count)
    }

    pub async fn scroll(
        &self,
        collection: &str,
        request: &ScrollRequest,
    ) -> Result<Vec<ScrolledPoint>, ProviderError> {
        let url = self.endpoint(&format!("/collections/{}/points/scroll", collection));
        let resp = self
            .authorize(self.client.post(url).json(request))
            .send()
            .await?;
        let parsed: QdrantResponse<ScrollResult> = ensure_success(resp).await?.json().await?;
        Ok(parsed.result.points)
    }

    pub async fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
        filter: Option<serde_json::Value>,
    ) -> Result<Vec<SearchResult>, ProviderError> {
        #[derive(Serialize)]
        struct SearchRequest {
            vector: Vec<f32>,
            limit: u64,
            with_payload: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            filter: Option<serde_json::Value>,
        }
        let url = self.endpoint(&format!("/collections/{}/points/search", collection));
        let body = SearchRequest {
            vector,
            limit,
            with_payload: true,
            filter,
        };
        let resp = self
            .authorize(self.client.post(url).json(&body))
            .send()
            .await?;
        let parsed: QdrantResponse<Vec<SearchResult>> = ensure_success(resp).await?.json().await?;
        Ok(parsed.result)
    }
}

#[derive(Debug, Default, Serialize)]
pub struct ScrollRequest {
    pub limit: u64,
    /// Payload keys to return.
    pub with_payload: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
}

#[derive(Debug, Serialize)]
pub struct OrderBy {
    pub key: String,
    pub direction: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct QdrantResponse<T> {
    pub result: T,
}

#[derive(Debug, Deserialize)]
pub struct CollectionsResult {
    pub collections: Vec<CollectionDescription>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionDescription {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CountResult {
    pub count: u64,
}

#[derive(Debug, Deserialize)]
pub struct ScrollResult {
    pub points: Vec<ScrolledPoint>,
}

#[derive(Debug, Deserialize)]
pub struct ScrolledPoint {
    pub id: serde_json::Value,
    pub payload: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SearchResult {
    pub id: serde_json::Value,
    pub score: f32,
    pub payload: Option<serde_json::Map<String, serde_json::Value>>,
}
