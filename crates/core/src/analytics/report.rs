use crate::analytics::breakdown::{DomainBreakdown, SourceBreakdown};
use crate::analytics::keywords::KeywordCount;
use crate::analytics::patterns::PublicationPatterns;
use crate::analytics::stats::SummaryStats;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const REPORT_SOURCE_ROWS: usize = 10;
pub const REPORT_KEYWORDS: usize = 20;

/// Everything the dashboard's overview needs, in one serialisable value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub timestamp: DateTime<Utc>,
    pub summary_stats: SummaryStats,
    pub domain_breakdown: Vec<DomainBreakdown>,
    pub source_breakdown: Vec<SourceBreakdown>,
    pub publication_patterns: PublicationPatterns,
    pub top_keywords: Vec<KeywordCount>,
}
