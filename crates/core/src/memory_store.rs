//! In-process [`VectorStore`] over JSON objects, for offline use and tests.

use crate::models::parse_published_date;
use crate::vectorstore::{Filter, NearTextQuery, ObjectQuery, StoredObject, VectorStore};
use providers::ProviderError;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

pub type DistanceFn = Arc<dyn Fn(&str, &Map<String, Value>) -> f64 + Send + Sync>;

#[derive(Clone)]
pub struct MemoryStore {
    classes: Vec<(String, Vec<Map<String, Value>>)>,
    reachable: bool,
    failing_counts: HashSet<String>,
    distance: DistanceFn,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            classes: Vec::new(),
            reachable: true,
            failing_counts: HashSet::new(),
            distance: Arc::new(token_distance),
        }
    }

    /// Adds a class; non-object values are ignored.
    pub fn with_class(mut self, name: &str, objects: Vec<Value>) -> Self {
        let objects = objects
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.classes.push((name.to_string(), objects));
        self
    }

    pub fn with_distance<F>(mut self, distance: F) -> Self
    where
        F: Fn(&str, &Map<String, Value>) -> f64 + Send + Sync + 'static,
    {
        self.distance = Arc::new(distance);
        self
    }

    /// Every call fails as if the endpoint refused the connection.
    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    /// Count queries for `class` fail server-side.
    pub fn with_failing_count(mut self, class: &str) -> Self {
        self.failing_counts.insert(class.to_string());
        self
    }

    fn check_reachable(&self) -> Result<(), ProviderError> {
        if self.reachable {
            Ok(())
        } else {
            Err(ProviderError::Unreachable("memory store offline".into()))
        }
    }

    fn objects(&self, class: &str) -> Result<&[Map<String, Value>], ProviderError> {
        self.check_reachable()?;
        self.classes
            .iter()
            .find(|(name, _)| name == class)
            .map(|(_, objects)| objects.as_slice())
            .ok_or_else(|| ProviderError::GraphQl(format!("class {} not found", class)))
    }
}

fn project(object: &Map<String, Value>, properties: &[String]) -> Map<String, Value> {
    properties
        .iter()
        .filter_map(|p| object.get(p).map(|v| (p.clone(), v.clone())))
        .collect()
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn matches(filter: &Filter, object: &Map<String, Value>) -> bool {
    match filter {
        Filter::Equal { field, value } => object
            .get(field)
            .and_then(value_text)
            .map(|v| &v == value)
            .unwrap_or(false),
        Filter::ContainsAny { field, values } => match object.get(field) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(value_text)
                .any(|item| values.contains(&item)),
            Some(other) => value_text(other)
                .map(|v| values.contains(&v))
                .unwrap_or(false),
            None => false,
        },
        Filter::After { field, instant } => object
            .get(field)
            .and_then(Value::as_str)
            .and_then(parse_published_date)
            .map(|date| date > *instant)
            .unwrap_or(false),
    }
}

fn compare_desc(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let date = |v: Option<&Value>| v.and_then(Value::as_str).and_then(parse_published_date);
    match (date(a), date(b)) {
        (Some(x), Some(y)) => return y.cmp(&x),
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        (None, None) => {}
    }
    match (a.and_then(Value::as_f64), b.and_then(Value::as_f64)) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// `1 - jaccard(query tokens, title + content tokens)`.
fn token_distance(query: &str, object: &Map<String, Value>) -> f64 {
    let tokens = |s: &str| -> HashSet<String> {
        s.split_whitespace().map(|t| t.to_lowercase()).collect()
    };
    let probe = tokens(query);
    let mut text = String::new();
    for key in ["title", "content"] {
        if let Some(Value::String(s)) = object.get(key) {
            text.push_str(s);
            text.push(' ');
        }
    }
    let doc = tokens(&text);
    let union = probe.union(&doc).count();
    if union == 0 {
        return 1.0;
    }
    1.0 - probe.intersection(&doc).count() as f64 / union as f64
}

#[async_trait::async_trait]
impl VectorStore for MemoryStore {
    async fn is_ready(&self) -> Result<bool, ProviderError> {
        self.check_reachable()?;
        Ok(true)
    }

    async fn list_classes(&self) -> Result<Vec<String>, ProviderError> {
        self.check_reachable()?;
        Ok(self.classes.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn count(&self, class: &str) -> Result<u64, ProviderError> {
        if self.failing_counts.contains(class) {
            self.check_reachable()?;
            return Err(ProviderError::GraphQl(format!("aggregate on {} failed", class)));
        }
        Ok(self.objects(class)?.len() as u64)
    }

    async fn fetch_objects(
        &self,
        class: &str,
        query: &ObjectQuery,
    ) -> Result<Vec<StoredObject>, ProviderError> {
        let mut selected: Vec<&Map<String, Value>> = self
            .objects(class)?
            .iter()
            .filter(|o| query.filter.as_ref().map_or(true, |f| matches(f, o)))
            .collect();
        if let Some(field) = &query.sort_desc {
            selected.sort_by(|a, b| compare_desc(a.get(field), b.get(field)));
        }
        Ok(selected
            .into_iter()
            .take(query.limit as usize)
            .map(|o| StoredObject {
                properties: project(o, &query.properties),
                distance: None,
            })
            .collect())
    }

    async fn near_text(
        &self,
        class: &str,
        query: &NearTextQuery,
    ) -> Result<Vec<StoredObject>, ProviderError> {
        let mut scored: Vec<(f64, &Map<String, Value>)> = self
            .objects(class)?
            .iter()
            .filter(|o| query.filter.as_ref().map_or(true, |f| matches(f, o)))
            .map(|o| ((self.distance)(&query.text, o), o))
            .collect();
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        Ok(scored
            .into_iter()
            .take(query.limit as usize)
            .map(|(distance, o)| StoredObject {
                properties: project(o, &query.properties),
                distance: Some(distance),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn contains_any_matches_scalars_and_arrays() {
        let filter = Filter::ContainsAny {
            field: "domain".into(),
            values: vec!["sport".into(), "calcio".into()],
        };
        let scalar = json!({ "domain": "calcio" });
        let list = json!({ "domain": ["politica", "sport"] });
        let miss = json!({ "domain": "politica" });
        assert!(matches(&filter, scalar.as_object().unwrap()));
        assert!(matches(&filter, list.as_object().unwrap()));
        assert!(!matches(&filter, miss.as_object().unwrap()));
    }

    #[test]
    fn token_distance_is_zero_for_identical_text() {
        let obj = json!({ "title": "mercato estivo", "content": "" });
        assert_eq!(token_distance("mercato estivo", obj.as_object().unwrap()), 0.0);
        let other = json!({ "title": "elezioni", "content": "" });
        assert_eq!(token_distance("mercato", other.as_object().unwrap()), 1.0);
    }
}
