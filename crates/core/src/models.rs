use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::{Serialize, Serializer};
use tracing::debug;

/// Properties requested from the store for every article query.
pub const ARTICLE_PROPERTIES: [&str; 9] = [
    "title",
    "content",
    "domain",
    "source",
    "published_date",
    "url",
    "author",
    "quality_score",
    "keywords",
];

/// Monday→Sunday, the display order for weekday distributions.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Source fields of an article as retrieved from the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArticleFields {
    pub title: String,
    pub content: String,
    pub domain: Option<String>,
    pub source: Option<String>,
    pub published_date: Option<DateTime<FixedOffset>>,
    pub url: Option<String>,
    pub author: Option<String>,
    pub quality_score: Option<f64>,
    pub keywords: Vec<String>,
}

/// Fields computed once from [`ArticleFields`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DerivedFields {
    pub date: Option<NaiveDate>,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub hour: Option<u32>,
    #[serde(serialize_with = "serialize_weekday")]
    pub weekday: Option<Weekday>,
    pub title_length: usize,
    pub title_word_count: usize,
    pub content_length: usize,
    pub content_word_count: usize,
    pub keywords_count: usize,
}

fn serialize_weekday<S: Serializer>(day: &Option<Weekday>, s: S) -> Result<S::Ok, S::Error> {
    match day {
        Some(d) => s.serialize_str(weekday_name(*d)),
        None => s.serialize_none(),
    }
}

impl DerivedFields {
    pub fn compute(fields: &ArticleFields) -> Self {
        let published = fields.published_date.map(|d| d.naive_local());
        Self {
            date: published.map(|d| d.date()),
            year: published.map(|d| d.year()),
            month: published.map(|d| d.month()),
            day: published.map(|d| d.day()),
            hour: published.map(|d| d.hour()),
            weekday: published.map(|d| d.weekday()),
            title_length: fields.title.chars().count(),
            title_word_count: fields.title.split_whitespace().count(),
            content_length: fields.content.chars().count(),
            content_word_count: fields.content.split_whitespace().count(),
            keywords_count: fields.keywords.len(),
        }
    }
}

/// One retrieved article. Immutable once built: derived fields always match
/// the source fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleRecord {
    #[serde(flatten)]
    raw: ArticleFields,
    #[serde(flatten)]
    derived: DerivedFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    similarity: Option<f64>,
}

impl ArticleRecord {
    pub fn new(raw: ArticleFields) -> Self {
        let derived = DerivedFields::compute(&raw);
        Self {
            raw,
            derived,
            similarity: None,
        }
    }

    /// Builds a record from a store object's properties, coercing malformed
    /// values to their missing marker.
    pub fn from_properties(props: &serde_json::Map<String, serde_json::Value>) -> Self {
        let published_date = match props.get("published_date") {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) => {
                let parsed = parse_published_date(s);
                if parsed.is_none() {
                    debug!(value = %s, "unparsable published_date");
                }
                parsed
            }
            Some(other) => {
                debug!(value = %other, "non-string published_date");
                None
            }
        };
        Self::new(ArticleFields {
            title: coerce_text(props.get("title")).unwrap_or_default(),
            content: coerce_text(props.get("content")).unwrap_or_default(),
            domain: coerce_text(props.get("domain")),
            source: coerce_text(props.get("source")),
            published_date,
            url: coerce_text(props.get("url")),
            author: coerce_text(props.get("author")),
            quality_score: coerce_number(props.get("quality_score")),
            keywords: coerce_keywords(props.get("keywords")),
        })
    }

    pub fn with_similarity(mut self, similarity: Option<f64>) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn raw(&self) -> &ArticleFields {
        &self.raw
    }

    pub fn derived(&self) -> &DerivedFields {
        &self.derived
    }

    pub fn similarity(&self) -> Option<f64> {
        self.similarity
    }

    pub fn domain(&self) -> Option<&str> {
        self.raw.domain.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.raw.source.as_deref()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.derived.date
    }

    pub fn quality_score(&self) -> Option<f64> {
        self.raw.quality_score
    }
}

/// Accepts RFC 3339, `YYYY-MM-DD[ T]HH:MM:SS[.f]` (taken as UTC) and bare
/// `YYYY-MM-DD` (midnight UTC).
pub fn parse_published_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt);
    }
    let utc = FixedOffset::east_opt(0)?;
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_local_timezone(utc).single()?);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|naive| naive.and_local_timezone(utc).single())
}

fn coerce_text(value: Option<&serde_json::Value>) -> Option<String> {
    match value? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Null => None,
        other => {
            debug!(value = %other, "non-scalar text field");
            None
        }
    }
}

fn coerce_number(value: Option<&serde_json::Value>) -> Option<f64> {
    let n = match value? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    if n.is_none() {
        debug!(value = ?value, "non-numeric quality_score");
    }
    n.filter(|v| v.is_finite())
}

fn coerce_keywords(value: Option<&serde_json::Value>) -> Vec<String> {
    match value {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// An ordered collection of articles. Filtering copies the qualifying records
/// into a new set; a set is never mutated after construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RecordSet {
    records: Vec<ArticleRecord>,
}

impl RecordSet {
    pub fn new(records: Vec<ArticleRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ArticleRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[ArticleRecord] {
        &self.records
    }

    pub fn filter<F>(&self, mut predicate: F) -> RecordSet
    where
        F: FnMut(&ArticleRecord) -> bool,
    {
        self.records
            .iter()
            .filter(|r| predicate(r))
            .cloned()
            .collect()
    }

    pub fn into_vec(self) -> Vec<ArticleRecord> {
        self.records
    }
}

impl FromIterator<ArticleRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = ArticleRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a ArticleRecord;
    type IntoIter = std::slice::Iter<'a, ArticleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
