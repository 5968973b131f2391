//! Stateless-per-call access to the article class of a vector store.

use crate::config::{AppConfig, SimilarityBounds, StoreBackend, StoreConfig};
use crate::error::StoreError;
use crate::export;
use crate::models::{ArticleRecord, RecordSet, ARTICLE_PROPERTIES};
use crate::search::{rank_by_similarity, similarity_from_distance};
use crate::vectorstore::{
    Filter, NearTextQuery, ObjectQuery, QdrantStore, StoredObject, VectorStore, WeaviateStore,
};
use chrono::{DateTime, Duration, Utc};
use providers::openai::{OpenAiConfig, OpenAiProvider};
use providers::qdrant::{QdrantClient, QdrantConfig};
use providers::weaviate::{WeaviateClient, WeaviateConfig};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-client settings that shape queries and results.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub class_name: String,
    pub default_limit: u64,
    pub similarity: SimilarityBounds,
}

impl From<&StoreConfig> for ClientSettings {
    fn from(cfg: &StoreConfig) -> Self {
        Self {
            class_name: cfg.class_name.clone(),
            default_limit: cfg.default_limit,
            similarity: cfg.similarity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassInfo {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaInfo {
    pub classes: Vec<ClassInfo>,
}

#[derive(Clone)]
pub struct StoreClient {
    store: Arc<dyn VectorStore>,
    settings: ClientSettings,
}

pub fn build_vector_store(cfg: &AppConfig) -> Result<Arc<dyn VectorStore>, StoreError> {
    let timeout = std::time::Duration::from_secs(cfg.store.timeout_secs);
    match cfg.store.backend {
        StoreBackend::Weaviate => {
            let client = WeaviateClient::new(WeaviateConfig {
                url: cfg.store.url.clone(),
                api_key: std::env::var("WEAVIATE_API_KEY").ok(),
                timeout,
            })?;
            Ok(Arc::new(WeaviateStore::new(client)))
        }
        StoreBackend::Qdrant => {
            let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
                StoreError::Unavailable("qdrant backend needs OPENAI_API_KEY for search".into())
            })?;
            let embedder = OpenAiProvider::new(OpenAiConfig {
                api_key,
                base_url: cfg.embeddings.base_url.clone(),
                embedding_model: cfg.embeddings.model.clone(),
                timeout,
            })?;
            let client = QdrantClient::new(QdrantConfig {
                url: cfg.store.url.clone(),
                api_key: std::env::var("QDRANT_API_KEY").ok(),
                timeout,
            })?;
            Ok(Arc::new(QdrantStore::new(client, Arc::new(embedder))))
        }
    }
}

fn projection() -> Vec<String> {
    ARTICLE_PROPERTIES.iter().map(|p| p.to_string()).collect()
}

impl StoreClient {
    pub fn new(store: Arc<dyn VectorStore>, settings: ClientSettings) -> Self {
        Self { store, settings }
    }

    /// Builds the configured backend and fails unless it reports ready.
    pub async fn connect(cfg: &AppConfig) -> Result<Self, StoreError> {
        let client = Self::new(build_vector_store(cfg)?, ClientSettings::from(&cfg.store));
        match client.store.is_ready().await {
            Ok(true) => {
                info!(url = %cfg.store.url, "connected to vector store");
                Ok(client)
            }
            Ok(false) => {
                warn!(url = %cfg.store.url, "vector store not ready");
                Err(StoreError::Unavailable(format!("{} is not ready", cfg.store.url)))
            }
            Err(e) => {
                warn!(url = %cfg.store.url, error = %e, "vector store unreachable");
                Err(StoreError::Unavailable(e.to_string()))
            }
        }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub async fn is_ready(&self) -> bool {
        matches!(self.store.is_ready().await, Ok(true))
    }

    /// Lists classes with their object counts. A failed count is logged and
    /// reported as 0 without affecting the other classes.
    pub async fn schema_info(&self) -> Result<SchemaInfo, StoreError> {
        let names = self.store.list_classes().await.map_err(|e| {
            warn!(error = %e, "schema listing failed");
            StoreError::from(e)
        })?;
        let mut classes = Vec::with_capacity(names.len());
        for name in names {
            let count = match self.store.count(&name).await {
                Ok(count) => count,
                Err(e) => {
                    warn!(class = %name, error = %e, "count failed, defaulting to 0");
                    0
                }
            };
            classes.push(ClassInfo { name, count });
        }
        Ok(SchemaInfo { classes })
    }

    async fn fetch(&self, query: ObjectQuery, what: &str) -> Result<RecordSet, StoreError> {
        let objects = self
            .store
            .fetch_objects(&self.settings.class_name, &query)
            .await
            .map_err(|e| {
                warn!(class = %self.settings.class_name, error = %e, "{} failed", what);
                StoreError::from(e)
            })?;
        let records: RecordSet = objects
            .iter()
            .map(|o| ArticleRecord::from_properties(&o.properties))
            .collect();
        info!(count = records.len(), "{} retrieved", what);
        Ok(records)
    }

    pub async fn fetch_all(&self, limit: u64) -> Result<RecordSet, StoreError> {
        let query = ObjectQuery {
            properties: projection(),
            limit,
            ..Default::default()
        };
        self.fetch(query, "fetch_all").await
    }

    pub async fn fetch_by_domain(&self, domain: &str, limit: u64) -> Result<RecordSet, StoreError> {
        let query = ObjectQuery {
            properties: projection(),
            limit,
            filter: Some(Filter::Equal {
                field: "domain".into(),
                value: domain.to_string(),
            }),
            sort_desc: None,
        };
        self.fetch(query, "fetch_by_domain").await
    }

    pub async fn fetch_recent(&self, days: i64, limit: u64) -> Result<RecordSet, StoreError> {
        self.fetch_recent_at(days, limit, Utc::now()).await
    }

    /// Articles published after `now - days`, newest first. Dateless articles
    /// cannot satisfy the cutoff and are never returned. A window reaching
    /// past the representable calendar has no cutoff: every dated article
    /// qualifies.
    pub async fn fetch_recent_at(
        &self,
        days: i64,
        limit: u64,
        now: DateTime<Utc>,
    ) -> Result<RecordSet, StoreError> {
        let cutoff = Duration::try_days(days).and_then(|window| now.checked_sub_signed(window));
        if cutoff.is_none() {
            debug!(days, "recency window out of range, fetching all dated articles");
        }
        let query = ObjectQuery {
            properties: projection(),
            limit,
            filter: cutoff.map(|instant| Filter::After {
                field: "published_date".into(),
                instant,
            }),
            sort_desc: Some("published_date".into()),
        };
        let mut records = self.fetch(query, "fetch_recent").await?.into_vec();
        records.retain(|r| r.raw().published_date.is_some());
        records.sort_by(|a, b| b.raw().published_date.cmp(&a.raw().published_date));
        Ok(RecordSet::new(records))
    }

    /// Nearest neighbours of `query_text`; `domain_filter` is applied by the
    /// store before the limit. Results are ordered by descending similarity.
    pub async fn search(
        &self,
        query_text: &str,
        limit: u64,
        domain_filter: Option<&[String]>,
    ) -> Result<RecordSet, StoreError> {
        let query = NearTextQuery {
            text: query_text.to_string(),
            properties: projection(),
            limit,
            filter: domain_filter
                .filter(|domains| !domains.is_empty())
                .map(|domains| Filter::ContainsAny {
                    field: "domain".into(),
                    values: domains.to_vec(),
                }),
        };
        let objects = self
            .store
            .near_text(&self.settings.class_name, &query)
            .await
            .map_err(|e| {
                warn!(query = query_text, error = %e, "semantic search failed");
                StoreError::from(e)
            })?;
        let mut records: Vec<ArticleRecord> = objects
            .iter()
            .map(|o| self.scored_record(o))
            .collect();
        rank_by_similarity(&mut records);
        info!(query = query_text, count = records.len(), "semantic search");
        Ok(RecordSet::new(records))
    }

    fn scored_record(&self, object: &StoredObject) -> ArticleRecord {
        let similarity = object
            .distance
            .map(|d| similarity_from_distance(d, self.settings.similarity));
        ArticleRecord::from_properties(&object.properties).with_similarity(similarity)
    }

    pub fn export_json(&self, records: &RecordSet, path: &Path) -> bool {
        match export::to_json(records, path) {
            Ok(n) => {
                info!(records = n, path = %path.display(), "exported json");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "json export failed");
                false
            }
        }
    }

    pub fn export_csv(&self, records: &RecordSet, path: &Path) -> bool {
        match export::to_csv(records, path) {
            Ok(n) => {
                info!(records = n, path = %path.display(), "exported csv");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "csv export failed");
                false
            }
        }
    }
}
