use crate::analytics::breakdown::group_by;
use crate::models::RecordSet;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashSet;

const TOP_ENTITIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub total_articles: usize,
    pub unique_domains: usize,
    pub unique_sources: usize,
    pub date_range: Option<DateRange>,
    pub recency: Option<RecencyCounts>,
    pub quality: Option<QualityStats>,
    pub top_domains: Vec<KeyCount>,
    pub top_sources: Vec<KeyCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days_covered: usize,
}

/// Articles dated today, within the last 7 days and within the last 30 days
/// (inclusive lower bounds, relative to the evaluation date).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecencyCounts {
    pub today: usize,
    pub last_7_days: usize,
    pub last_30_days: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; `None` with fewer than two scores.
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyCount {
    pub key: String,
    pub count: usize,
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Standard deviation with Bessel's correction.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub fn quality_stats(records: &RecordSet) -> Option<QualityStats> {
    let scores: Vec<f64> = records.iter().filter_map(|r| r.quality_score()).collect();
    let min = scores.iter().copied().reduce(f64::min)?;
    let max = scores.iter().copied().reduce(f64::max)?;
    Some(QualityStats {
        count: scores.len(),
        mean: mean(&scores)?,
        median: median(&scores)?,
        std: sample_std(&scores),
        min,
        max,
    })
}

fn top_keys<'a, F>(records: &'a RecordSet, key: F) -> Vec<KeyCount>
where
    F: Fn(&'a crate::models::ArticleRecord) -> Option<&'a str>,
{
    group_by(records, |r| key(r).map(str::to_string))
        .into_iter()
        .take(TOP_ENTITIES)
        .map(|(key, members)| KeyCount {
            key,
            count: members.len(),
        })
        .collect()
}

pub fn summary_stats(records: &RecordSet, now: DateTime<Utc>) -> SummaryStats {
    let unique_domains: HashSet<&str> = records.iter().filter_map(|r| r.domain()).collect();
    let unique_sources: HashSet<&str> = records.iter().filter_map(|r| r.source()).collect();
    let dates: Vec<NaiveDate> = records.iter().filter_map(|r| r.date()).collect();

    let (date_range, recency) = match (dates.iter().min(), dates.iter().max()) {
        (Some(&start), Some(&end)) => {
            let distinct_days: HashSet<&NaiveDate> = dates.iter().collect();
            let today = now.date_naive();
            let since = |window: i64| {
                let cutoff = today - Duration::days(window);
                dates.iter().filter(|d| **d >= cutoff).count()
            };
            (
                Some(DateRange {
                    start,
                    end,
                    days_covered: distinct_days.len(),
                }),
                Some(RecencyCounts {
                    today: dates.iter().filter(|d| **d == today).count(),
                    last_7_days: since(7),
                    last_30_days: since(30),
                }),
            )
        }
        _ => (None, None),
    };

    SummaryStats {
        total_articles: records.len(),
        unique_domains: unique_domains.len(),
        unique_sources: unique_sources.len(),
        date_range,
        recency,
        quality: quality_stats(records),
        top_domains: top_keys(records, |r| r.domain()),
        top_sources: top_keys(records, |r| r.source()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_helpers_match_pandas_conventions() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(mean(&v), Some(2.5));
        assert_eq!(median(&v), Some(2.5));
        assert!((sample_std(&v).unwrap() - 1.290_994_448_735_805_6).abs() < 1e-12);
        assert_eq!(sample_std(&[5.0]), None);
        assert_eq!(mean(&[]), None);
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(0.123_456, 3), 0.123);
        assert_eq!(round_to(59.96, 1), 60.0);
    }
}
