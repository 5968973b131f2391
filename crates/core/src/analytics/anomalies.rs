use crate::analytics::stats::{mean, sample_std};
use crate::models::{ArticleRecord, RecordSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyMethod {
    /// `|x - mean| / std > threshold` over a numeric field.
    ZScore,
    /// Character length outside `mean ± threshold * std` over a text field.
    Length,
}

/// Record fields addressable by anomaly detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Content,
    Domain,
    Source,
    QualityScore,
    Year,
    Month,
    Day,
    Hour,
    TitleLength,
    TitleWordCount,
    ContentLength,
    ContentWordCount,
    KeywordsCount,
}

impl Field {
    pub fn numeric_value(self, record: &ArticleRecord) -> Option<f64> {
        let d = record.derived();
        match self {
            Field::QualityScore => record.quality_score(),
            Field::Year => d.year.map(f64::from),
            Field::Month => d.month.map(f64::from),
            Field::Day => d.day.map(f64::from),
            Field::Hour => d.hour.map(f64::from),
            Field::TitleLength => Some(d.title_length as f64),
            Field::TitleWordCount => Some(d.title_word_count as f64),
            Field::ContentLength => Some(d.content_length as f64),
            Field::ContentWordCount => Some(d.content_word_count as f64),
            Field::KeywordsCount => Some(d.keywords_count as f64),
            Field::Title | Field::Content | Field::Domain | Field::Source => None,
        }
    }

    /// Character length, for the free-text fields only.
    pub fn text_length(self, record: &ArticleRecord) -> Option<f64> {
        match self {
            Field::Title => Some(record.derived().title_length as f64),
            Field::Content => Some(record.derived().content_length as f64),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Content => "content",
            Field::Domain => "domain",
            Field::Source => "source",
            Field::QualityScore => "quality_score",
            Field::Year => "year",
            Field::Month => "month",
            Field::Day => "day",
            Field::Hour => "hour",
            Field::TitleLength => "title_length",
            Field::TitleWordCount => "title_word_count",
            Field::ContentLength => "content_length",
            Field::ContentWordCount => "content_word_count",
            Field::KeywordsCount => "keywords_count",
        }
    }
}

const ALL_FIELDS: [Field; 14] = [
    Field::Title,
    Field::Content,
    Field::Domain,
    Field::Source,
    Field::QualityScore,
    Field::Year,
    Field::Month,
    Field::Day,
    Field::Hour,
    Field::TitleLength,
    Field::TitleWordCount,
    Field::ContentLength,
    Field::ContentWordCount,
    Field::KeywordsCount,
];

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_FIELDS
            .iter()
            .copied()
            .find(|f| f.name() == s)
            .ok_or_else(|| format!("unknown field: {}", s))
    }
}

impl FromStr for AnomalyMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zscore" | "z_score" => Ok(AnomalyMethod::ZScore),
            "length" => Ok(AnomalyMethod::Length),
            other => Err(format!("unknown anomaly method: {}", other)),
        }
    }
}

/// Records whose value lies more than `threshold` standard deviations from
/// the mean. Empty when the field does not suit the method, when fewer than
/// two values exist, or when the deviation is zero. Records missing the value
/// are never flagged.
pub fn detect_anomalies(
    records: &RecordSet,
    field: Field,
    method: AnomalyMethod,
    threshold: f64,
) -> RecordSet {
    let value = |r: &ArticleRecord| match method {
        AnomalyMethod::ZScore => field.numeric_value(r),
        AnomalyMethod::Length => field.text_length(r),
    };
    let values: Vec<f64> = records.iter().filter_map(value).collect();
    let (Some(m), Some(std)) = (mean(&values), sample_std(&values)) else {
        return RecordSet::default();
    };
    if std == 0.0 || !std.is_finite() {
        return RecordSet::default();
    }
    match method {
        AnomalyMethod::ZScore => records.filter(|r| {
            value(r)
                .map(|x| (x - m).abs() / std > threshold)
                .unwrap_or(false)
        }),
        AnomalyMethod::Length => {
            let low = m - threshold * std;
            let high = m + threshold * std;
            records.filter(|r| value(r).map(|x| x < low || x > high).unwrap_or(false))
        }
    }
}
