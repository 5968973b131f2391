//! The query surface this crate needs from a vector store, and the backends
//! that provide it.

use chrono::{DateTime, SecondsFormat, Utc};
use providers::qdrant::{OrderBy, QdrantClient, ScrollRequest, SearchResult};
use providers::weaviate::{GetQuery, WeaviateClient, WhereFilter};
use providers::{EmbeddingProvider, ProviderError};
use std::sync::Arc;

/// Filters a store must be able to apply server-side.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Equal { field: String, value: String },
    ContainsAny { field: String, values: Vec<String> },
    /// Strictly later than `instant`; values that are not dates never match.
    After { field: String, instant: DateTime<Utc> },
}

#[derive(Debug, Clone, Default)]
pub struct ObjectQuery {
    pub properties: Vec<String>,
    pub limit: u64,
    pub filter: Option<Filter>,
    /// Field to order by, newest/largest first.
    pub sort_desc: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NearTextQuery {
    pub text: String,
    pub properties: Vec<String>,
    pub limit: u64,
    pub filter: Option<Filter>,
}

#[derive(Debug, Clone, Default)]
pub struct StoredObject {
    pub properties: serde_json::Map<String, serde_json::Value>,
    pub distance: Option<f64>,
}

#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    async fn is_ready(&self) -> Result<bool, ProviderError>;
    async fn list_classes(&self) -> Result<Vec<String>, ProviderError>;
    async fn count(&self, class: &str) -> Result<u64, ProviderError>;
    async fn fetch_objects(
        &self,
        class: &str,
        query: &ObjectQuery,
    ) -> Result<Vec<StoredObject>, ProviderError>;
    /// Nearest neighbours of `query.text`, closest first, filter applied
    /// before the limit.
    async fn near_text(
        &self,
        class: &str,
        query: &NearTextQuery,
    ) -> Result<Vec<StoredObject>, ProviderError>;
}

pub struct WeaviateStore {
    client: WeaviateClient,
}

impl WeaviateStore {
    pub fn new(client: WeaviateClient) -> Self {
        Self { client }
    }
}

fn where_filter(filter: &Filter) -> WhereFilter {
    match filter {
        Filter::Equal { field, value } => WhereFilter::Equal {
            path: field.clone(),
            value: value.clone(),
        },
        Filter::ContainsAny { field, values } => WhereFilter::ContainsAny {
            path: field.clone(),
            values: values.clone(),
        },
        Filter::After { field, instant } => WhereFilter::GreaterThanDate {
            path: field.clone(),
            value: instant.to_rfc3339_opts(SecondsFormat::Secs, true),
        },
    }
}

#[async_trait::async_trait]
impl VectorStore for WeaviateStore {
    async fn is_ready(&self) -> Result<bool, ProviderError> {
        self.client.is_ready().await
    }

    async fn list_classes(&self) -> Result<Vec<String>, ProviderError> {
        let schema = self.client.schema().await?;
        Ok(schema.classes.into_iter().map(|c| c.class).collect())
    }

    async fn count(&self, class: &str) -> Result<u64, ProviderError> {
        self.client.aggregate_count(class).await
    }

    async fn fetch_objects(
        &self,
        class: &str,
        query: &ObjectQuery,
    ) -> Result<Vec<StoredObject>, ProviderError> {
        let get = GetQuery {
            properties: query.properties.clone(),
            limit: query.limit,
            filter: query.filter.as_ref().map(where_filter),
            sort: query.sort_desc.clone().map(|field| (field, true)),
            near_text: None,
        };
        let objects = self.client.get(class, &get).await?;
        Ok(objects
            .into_iter()
            .map(|o| StoredObject {
                properties: o.properties,
                distance: o.distance,
            })
            .collect())
    }

    async fn near_text(
        &self,
        class: &str,
        query: &NearTextQuery,
    ) -> Result<Vec<StoredObject>, ProviderError> {
        let get = GetQuery {
            properties: query.properties.clone(),
            limit: query.limit,
            filter: query.filter.as_ref().map(where_filter),
            sort: None,
            near_text: Some(query.text.clone()),
        };
        let objects = self.client.get(class, &get).await?;
        Ok(objects
            .into_iter()
            .map(|o| StoredObject {
                properties: o.properties,
                distance: o.distance,
            })
            .collect())
    }
}

/// Qdrant has no server-side text vectoriser, so probes are embedded through
/// an [`EmbeddingProvider`]. Reported distances are `1 - score`.
pub struct QdrantStore {
    client: QdrantClient,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl QdrantStore {
    pub fn new(client: QdrantClient, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { client, embedder }
    }
}

pub fn qdrant_filter(filter: &Filter) -> serde_json::Value {
    let condition = match filter {
        Filter::Equal { field, value } => serde_json::json!({
            "key": field,
            "match": { "value": value }
        }),
        Filter::ContainsAny { field, values } => serde_json::json!({
            "key": field,
            "match": { "any": values }
        }),
        Filter::After { field, instant } => serde_json::json!({
            "key": field,
            "range": { "gt": instant.to_rfc3339_opts(SecondsFormat::Secs, true) }
        }),
    };
    serde_json::json!({ "must": [condition] })
}

#[async_trait::async_trait]
impl VectorStore for QdrantStore {
    async fn is_ready(&self) -> Result<bool, ProviderError> {
        self.client.is_ready().await
    }

    async fn list_classes(&self) -> Result<Vec<String>, ProviderError> {
        self.client.list_collections().await
    }

    async fn count(&self, class: &str) -> Result<u64, ProviderError> {
        self.client.count(class).await
    }

    async fn fetch_objects(
        &self,
        class: &str,
        query: &ObjectQuery,
    ) -> Result<Vec<StoredObject>, ProviderError> {
        let request = ScrollRequest {
            limit: query.limit,
            with_payload: query.properties.clone(),
            filter: query.filter.as_ref().map(qdrant_filter),
            order_by: query.sort_desc.clone().map(|key| OrderBy {
                key,
                direction: "desc",
            }),
        };
        let points = self.client.scroll(class, &request).await?;
        Ok(points
            .into_iter()
            .map(|p| StoredObject {
                properties: p.payload.unwrap_or_default(),
                distance: None,
            })
            .collect())
    }

    async fn near_text(
        &self,
        class: &str,
        query: &NearTextQuery,
    ) -> Result<Vec<StoredObject>, ProviderError> {
        let embedded = self.embedder.embed(&[query.text.clone()]).await?;
        let vector = embedded
            .vectors
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::Decode("embedding provider returned nothing".into()))?;
        let results = self
            .client
            .search(class, vector, query.limit, query.filter.as_ref().map(qdrant_filter))
            .await?;
        Ok(search_hits(results, &query.properties))
    }
}

/// Projects each hit's payload onto `properties`; distance is `1 - score`.
fn search_hits(results: Vec<SearchResult>, properties: &[String]) -> Vec<StoredObject> {
    results
        .into_iter()
        .map(|r| {
            let mut payload = r.payload.unwrap_or_default();
            payload.retain(|k, _| properties.iter().any(|p| p == k));
            StoredObject {
                properties: payload,
                distance: Some(1.0 - f64::from(r.score)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use providers::qdrant::QdrantConfig;
    use providers::EmbedResponse;
    use serde_json::json;
    use std::time::Duration;

    struct FixedEmbedder(Vec<Vec<f32>>);

    #[async_trait::async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<EmbedResponse, ProviderError> {
            Ok(EmbedResponse {
                vectors: self.0.clone(),
            })
        }
    }

    fn refused_qdrant(embedder: FixedEmbedder) -> QdrantStore {
        let client = QdrantClient::new(QdrantConfig {
            url: "http://127.0.0.1:1".into(),
            api_key: None,
            timeout: Duration::from_secs(2),
        })
        .unwrap();
        QdrantStore::new(client, Arc::new(embedder))
    }

    fn probe_query() -> NearTextQuery {
        NearTextQuery {
            text: "calciomercato".into(),
            properties: vec!["title".into()],
            limit: 5,
            filter: None,
        }
    }

    #[test]
    fn search_hits_report_distance_and_project_payload() {
        let hits = vec![
            SearchResult {
                id: json!(1),
                score: 0.75,
                payload: json!({ "title": "Inter", "domain": "sport", "vector_id": 9 })
                    .as_object()
                    .cloned(),
            },
            SearchResult {
                id: json!(2),
                score: 1.5,
                payload: None,
            },
        ];
        let objects = search_hits(hits, &["title".to_string(), "domain".to_string()]);
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].distance, Some(0.25));
        assert_eq!(objects[0].properties.len(), 2);
        assert!(objects[0].properties.get("vector_id").is_none());
        assert_eq!(objects[1].distance, Some(-0.5));
        assert!(objects[1].properties.is_empty());
    }

    #[tokio::test]
    async fn qdrant_near_text_needs_an_embedding() {
        let store = refused_qdrant(FixedEmbedder(vec![]));
        let err = store.near_text("news", &probe_query()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[tokio::test]
    async fn qdrant_near_text_against_refused_endpoint_is_unreachable() {
        let store = refused_qdrant(FixedEmbedder(vec![vec![0.1, 0.2, 0.3]]));
        let err = store.near_text("news", &probe_query()).await.unwrap_err();
        assert!(err.is_unreachable());
    }

    #[test]
    fn qdrant_filters_use_match_and_range() {
        let any = qdrant_filter(&Filter::ContainsAny {
            field: "domain".into(),
            values: vec!["sport".into()],
        });
        assert_eq!(any["must"][0]["match"]["any"][0], "sport");

        let after = qdrant_filter(&Filter::After {
            field: "published_date".into(),
            instant: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        });
        assert_eq!(after["must"][0]["range"]["gt"], "2024-05-01T00:00:00Z");
    }

    #[test]
    fn weaviate_date_filter_is_rfc3339() {
        let f = where_filter(&Filter::After {
            field: "published_date".into(),
            instant: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        });
        assert_eq!(
            f,
            WhereFilter::GreaterThanDate {
                path: "published_date".into(),
                value: "2024-05-01T12:00:00Z".into()
            }
        );
    }
}
