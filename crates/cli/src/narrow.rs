use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use newslens_core::AnalyticsEngine;

/// In-memory narrowing applied to fetched records before analysis.
#[derive(Debug, Clone, Default)]
pub struct Narrowing {
    pub domains: Vec<String>,
    pub sources: Vec<String>,
    pub since: Option<String>,
    pub until: Option<String>,
    pub min_quality: Option<f64>,
    pub max_quality: Option<f64>,
}

pub fn parse_day(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid date {:?}, expected YYYY-MM-DD", raw))
}

impl Narrowing {
    pub fn apply(&self, engine: AnalyticsEngine) -> Result<AnalyticsEngine> {
        let mut engine = engine;
        if !self.domains.is_empty() {
            let domains: Vec<&str> = self.domains.iter().map(String::as_str).collect();
            engine = engine.by_domain(&domains);
        }
        if !self.sources.is_empty() {
            let sources: Vec<&str> = self.sources.iter().map(String::as_str).collect();
            engine = engine.by_source(&sources);
        }
        if self.since.is_some() || self.until.is_some() {
            let start = match &self.since {
                Some(s) => parse_day(s)?,
                None => NaiveDate::MIN,
            };
            let end = match &self.until {
                Some(s) => parse_day(s)?,
                None => NaiveDate::MAX,
            };
            if start > end {
                bail!("--since {} is after --until {}", start, end);
            }
            engine = engine.by_date_range(start, end);
        }
        if self.min_quality.is_some() || self.max_quality.is_some() {
            engine = engine.by_quality_range(
                self.min_quality.unwrap_or(f64::NEG_INFINITY),
                self.max_quality.unwrap_or(f64::INFINITY),
            );
        }
        Ok(engine)
    }
}
