use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Weaviate,
    Qdrant,
}

/// How store distances are turned into similarities (`1 - distance`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityBounds {
    /// No bound is assumed on the store's metric; similarity may leave [0, 1].
    #[default]
    Raw,
    /// The metric is asserted to lie in [0, 1]; similarity is clamped there.
    UnitClamped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,
    #[serde(default = "default_url")]
    pub url: String,
    /// Target class (Weaviate) or collection (Qdrant).
    #[serde(default = "default_class_name")]
    pub class_name: String,
    #[serde(default = "default_limit")]
    pub default_limit: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub similarity: SimilarityBounds,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            url: default_url(),
            class_name: default_class_name(),
            default_limit: default_limit(),
            timeout_secs: default_timeout_secs(),
            similarity: SimilarityBounds::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embedding_url(),
            model: default_embedding_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default = "default_anomaly_threshold")]
    pub anomaly_threshold: f64,
    #[serde(default = "default_stopwords")]
    pub stopwords: Vec<String>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            anomaly_threshold: default_anomaly_threshold(),
            stopwords: default_stopwords(),
        }
    }
}

fn default_backend() -> StoreBackend {
    StoreBackend::Weaviate
}

fn default_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_class_name() -> String {
    "NewsArticles_IT".to_string()
}

fn default_limit() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_embedding_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_anomaly_threshold() -> f64 {
    3.0
}

/// Italian function words dropped from keyword counts.
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "il", "la", "di", "che", "e", "è", "un", "una", "per", "con", "non", "su", "del", "della",
    "dei", "delle", "da", "in", "a", "al", "alla", "dai", "dalle", "dal", "dalla", "le", "i",
    "gli", "lo", "li", "si", "mi", "ti", "ci", "vi", "se", "ma", "anche", "come", "più", "dopo",
    "molto", "bene", "dove", "solo", "prima", "stata", "stato", "ogni", "tra", "nel", "nella",
    "nelle", "nei", "questo", "questa", "questi", "queste", "suo", "sua", "suoi", "sue", "ha",
    "hanno", "aveva", "erano", "essere", "anni", "anno", "oggi",
];

fn default_stopwords() -> Vec<String> {
    DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect()
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
