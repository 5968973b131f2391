//! Weaviate client: REST for readiness and schema, GraphQL for `Get` and
//! `Aggregate` queries.

use crate::{build_http_client, ensure_success, ProviderError};
use regex::Regex;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

static GRAPHQL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[_A-Za-z][_0-9A-Za-z]*$").expect("valid graphql name pattern"));

/// Class names are spliced into query text, so only GraphQL names pass.
fn check_class_name(class: &str) -> Result<(), ProviderError> {
    if GRAPHQL_NAME.is_match(class) {
        Ok(())
    } else {
        Err(ProviderError::RequestFailed(format!(
            "invalid class name {:?}",
            class
        )))
    }
}

#[derive(Clone, Debug)]
pub struct WeaviateConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct WeaviateClient {
    client: Client,
    cfg: WeaviateConfig,
}

/// A `where` clause in Weaviate's GraphQL filter language.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereFilter {
    Equal { path: String, value: String },
    ContainsAny { path: String, values: Vec<String> },
    /// `value` must be an RFC 3339 timestamp.
    GreaterThanDate { path: String, value: String },
}

#[derive(Debug, Clone, Default)]
pub struct GetQuery {
    pub properties: Vec<String>,
    pub limit: u64,
    pub filter: Option<WhereFilter>,
    /// Property to sort on, descending when the flag is set.
    pub sort: Option<(String, bool)>,
    pub near_text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WeaviateObject {
    pub properties: serde_json::Map<String, serde_json::Value>,
    pub distance: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WeaviateSchema {
    #[serde(default)]
    pub classes: Vec<WeaviateClass>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WeaviateClass {
    pub class: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl WeaviateClient {
    pub fn new(cfg: WeaviateConfig) -> Result<Self, ProviderError> {
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
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    pub async fn is_ready(&self) -> Result<bool, ProviderError> {
        let resp = self
            .authorize(self.client.get(self.endpoint("/v1/.well-known/ready")))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    pub async fn schema(&self) -> Result<WeaviateSchema, ProviderError> {
        let resp = self
            .authorize(self.client.get(self.endpoint("/v1/schema")))
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        Ok(resp.json().await?)
    }

    /// Runs a GraphQL query and returns its `data` member.
    pub async fn graphql(&self, query: &str) -> Result<serde_json::Value, ProviderError> {
        #[derive(Serialize)]
        struct GraphQlRequest<'a> {
            query: &'a str,
        }
        debug!(query, "weaviate graphql");
        let resp = self
            .authorize(self.client.post(self.endpoint("/v1/graphql")))
            .json(&GraphQlRequest { query })
            .send()
            .await?;
        let resp = ensure_success(resp).await?;
        let parsed: GraphQlResponse = resp.json().await?;
        if !parsed.errors.is_empty() {
            let messages: Vec<String> = parsed.errors.into_iter().map(|e| e.message).collect();
            return Err(ProviderError::GraphQl(messages.join("; ")));
        }
        parsed
            .data
            .ok_or_else(|| ProviderError::Decode("graphql response without data".into()))
    }

    pub async fn aggregate_count(&self, class: &str) -> Result<u64, ProviderError> {
        check_class_name(class)?;
        let query = format!("{{ Aggregate {{ {} {{ meta {{ count }} }} }} }}", class);
        let data = self.graphql(&query).await?;
        data.get("Aggregate")
            .and_then(|a| a.get(class))
            .and_then(|rows| rows.get(0))
            .and_then(|row| row.get("meta"))
            .and_then(|meta| meta.get("count"))
            .and_then(|c| c.as_u64())
            .ok_or_else(|| ProviderError::Decode(format!("no aggregate count for {}", class)))
    }

    pub async fn get(
        &self,
        class: &str,
        query: &GetQuery,
    ) -> Result<Vec<WeaviateObject>, ProviderError> {
        check_class_name(class)?;
        let data = self.graphql(&query.to_graphql(class)).await?;
        let rows = match data.get("Get").and_then(|g| g.get(class)) {
            Some(serde_json::Value::Array(rows)) => rows.clone(),
            Some(serde_json::Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(ProviderError::Decode(format!(
                    "expected array for {}, got {}",
                    class, other
                )))
            }
        };
        Ok(rows.into_iter().filter_map(parse_object).collect())
    }
}

fn parse_object(row: serde_json::Value) -> Option<WeaviateObject> {
    let serde_json::Value::Object(mut properties) = row else {
        return None;
    };
    let distance = properties
        .remove("_additional")
        .and_then(|extra| extra.get("distance").and_then(|d| d.as_f64()));
    Some(WeaviateObject {
        properties,
        distance,
    })
}

fn quote(s: &str) -> String {
    // JSON string literals are valid GraphQL string literals.
    serde_json::Value::String(s.to_string()).to_string()
}

impl WhereFilter {
    fn to_graphql(&self) -> String {
        match self {
            WhereFilter::Equal { path, value } => format!(
                "{{path: [{}], operator: Equal, valueText: {}}}",
                quote(path),
                quote(value)
            ),
            WhereFilter::ContainsAny { path, values } => {
                let values: Vec<String> = values.iter().map(|v| quote(v)).collect();
                format!(
                    "{{path: [{}], operator: ContainsAny, valueText: [{}]}}",
                    quote(path),
                    values.join(", ")
                )
            }
            WhereFilter::GreaterThanDate { path, value } => format!(
                "{{path: [{}], operator: GreaterThan, valueDate: {}}}",
                quote(path),
                quote(value)
            ),
        }
    }
}

impl GetQuery {
    pub fn to_graphql(&self, class: &str) -> String {
        let mut args = vec![format!("limit: {}", self.limit)];
        if let Some(text) = &self.near_text {
            args.push(format!("nearText: {{concepts: [{}]}}", quote(text)));
        }
        if let Some(filter) = &self.filter {
            args.push(format!("where: {}", filter.to_graphql()));
        }
        if let Some((path, descending)) = &self.sort {
            let order = if *descending { "desc" } else { "asc" };
            args.push(format!("sort: [{{path: [{}], order: {}}}]", quote(path), order));
        }
        let mut fields = self.properties.join(" ");
        if self.near_text.is_some() {
            fields.push_str(" _additional { distance }");
        }
        format!(
            "{{ Get {{ {}({}) {{ {} }} }} }}",
            class,
            args.join(", "),
            fields
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_query_renders_filter_and_sort() {
        let q = GetQuery {
            properties: vec!["title".into(), "published_date".into()],
            limit: 50,
            filter: Some(WhereFilter::GreaterThanDate {
                path: "published_date".into(),
                value: "2024-05-01T00:00:00Z".into(),
            }),
            sort: Some(("published_date".into(), true)),
            near_text: None,
        };
        assert_eq!(
            q.to_graphql("NewsArticles_IT"),
            "{ Get { NewsArticles_IT(limit: 50, \
             where: {path: [\"published_date\"], operator: GreaterThan, valueDate: \"2024-05-01T00:00:00Z\"}, \
             sort: [{path: [\"published_date\"], order: desc}]) { title published_date } } }"
        );
    }

    #[test]
    fn near_text_requests_distance_and_escapes_probe() {
        let q = GetQuery {
            properties: vec!["title".into()],
            limit: 3,
            filter: Some(WhereFilter::ContainsAny {
                path: "domain".into(),
                values: vec!["sport".into(), "calcio".into()],
            }),
            sort: None,
            near_text: Some("the \"transfer\" market".into()),
        };
        let rendered = q.to_graphql("News");
        assert!(rendered.contains("nearText: {concepts: [\"the \\\"transfer\\\" market\"]}"));
        assert!(rendered.contains("operator: ContainsAny, valueText: [\"sport\", \"calcio\"]"));
        assert!(rendered.contains("_additional { distance }"));
    }

    #[test]
    fn class_names_must_be_graphql_names() {
        assert!(check_class_name("NewsArticles_IT").is_ok());
        assert!(check_class_name("_private2").is_ok());
        for bad in ["", "2024News", "News Articles", "News) { x }", "Notizie-IT"] {
            assert!(
                matches!(check_class_name(bad), Err(ProviderError::RequestFailed(_))),
                "{:?} accepted",
                bad
            );
        }
    }

    #[tokio::test]
    async fn invalid_class_is_rejected_before_any_request() {
        let client = WeaviateClient::new(WeaviateConfig {
            url: "http://127.0.0.1:1".into(),
            api_key: None,
            timeout: Duration::from_secs(2),
        })
        .unwrap();
        let err = client
            .get("News { }", &GetQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::RequestFailed(_)));
        let err = client.aggregate_count("a b").await.unwrap_err();
        assert!(!err.is_unreachable());
    }

    #[test]
    fn parse_object_splits_additional() {
        let obj = parse_object(serde_json::json!({
            "title": "a",
            "_additional": { "distance": 0.25 }
        }))
        .unwrap();
        assert_eq!(obj.distance, Some(0.25));
        assert!(obj.properties.get("_additional").is_none());
        assert_eq!(obj.properties["title"], "a");
    }
}
