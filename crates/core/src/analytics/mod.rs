//! Derived statistics over a retrieved record set.
//!
//! An [`AnalyticsEngine`] owns its records and never changes after
//! construction: filters return a new engine over a copied subset, and every
//! statistic is recomputed on demand from the same immutable state.

pub mod anomalies;
pub mod breakdown;
pub mod keywords;
pub mod patterns;
pub mod report;
pub mod stats;

use crate::config::AnalyticsConfig;
use crate::models::RecordSet;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;
use std::sync::Arc;

pub use anomalies::{AnomalyMethod, Field};
pub use breakdown::{DailyCount, DomainBreakdown, SourceBreakdown};
pub use keywords::KeywordCount;
pub use patterns::{PublicationPatterns, WeekdayCount};
pub use report::SummaryReport;
pub use stats::{DateRange, KeyCount, QualityStats, RecencyCounts, SummaryStats};

#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    records: RecordSet,
    stopwords: Arc<HashSet<String>>,
}

impl AnalyticsEngine {
    pub fn new(records: RecordSet) -> Self {
        Self::with_config(records, &AnalyticsConfig::default())
    }

    pub fn with_config(records: RecordSet, cfg: &AnalyticsConfig) -> Self {
        Self {
            records,
            stopwords: Arc::new(cfg.stopwords.iter().map(|s| s.to_lowercase()).collect()),
        }
    }

    fn narrowed(&self, records: RecordSet) -> Self {
        Self {
            records,
            stopwords: Arc::clone(&self.stopwords),
        }
    }

    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn by_domain(&self, domains: &[&str]) -> Self {
        self.narrowed(
            self.records
                .filter(|r| r.domain().map_or(false, |d| domains.contains(&d))),
        )
    }

    pub fn by_source(&self, sources: &[&str]) -> Self {
        self.narrowed(
            self.records
                .filter(|r| r.source().map_or(false, |s| sources.contains(&s))),
        )
    }

    /// Inclusive on both ends; dateless records are dropped.
    pub fn by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Self {
        self.narrowed(
            self.records
                .filter(|r| r.date().map_or(false, |d| d >= start && d <= end)),
        )
    }

    /// Inclusive on both ends; unscored records are dropped.
    pub fn by_quality_range(&self, min: f64, max: f64) -> Self {
        self.narrowed(
            self.records
                .filter(|r| r.quality_score().map_or(false, |q| q >= min && q <= max)),
        )
    }

    pub fn summary_stats(&self) -> SummaryStats {
        self.summary_stats_at(Utc::now())
    }

    pub fn summary_stats_at(&self, now: DateTime<Utc>) -> SummaryStats {
        stats::summary_stats(&self.records, now)
    }

    pub fn daily_counts(&self) -> Vec<DailyCount> {
        breakdown::daily_counts(&self.records)
    }

    pub fn domain_breakdown(&self) -> Vec<DomainBreakdown> {
        breakdown::domain_breakdown(&self.records)
    }

    pub fn source_breakdown(&self) -> Vec<SourceBreakdown> {
        breakdown::source_breakdown(&self.records)
    }

    pub fn top_keywords(&self, n: usize) -> Vec<KeywordCount> {
        keywords::top_keywords(&self.records, &self.stopwords, n)
    }

    pub fn publication_patterns(&self) -> PublicationPatterns {
        patterns::publication_patterns(&self.records)
    }

    pub fn detect_anomalies(&self, field: Field, method: AnomalyMethod, threshold: f64) -> RecordSet {
        anomalies::detect_anomalies(&self.records, field, method, threshold)
    }

    pub fn summary_report(&self) -> SummaryReport {
        self.summary_report_at(Utc::now())
    }

    pub fn summary_report_at(&self, now: DateTime<Utc>) -> SummaryReport {
        let mut source_breakdown = self.source_breakdown();
        source_breakdown.truncate(report::REPORT_SOURCE_ROWS);
        SummaryReport {
            timestamp: now,
            summary_stats: self.summary_stats_at(now),
            domain_breakdown: self.domain_breakdown(),
            source_breakdown,
            publication_patterns: self.publication_patterns(),
            top_keywords: self.top_keywords(report::REPORT_KEYWORDS),
        }
    }
}
