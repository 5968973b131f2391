//! Group-by aggregations over a record set.

use crate::analytics::stats::{mean, round_to};
use crate::models::{ArticleRecord, RecordSet};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub articles: usize,
    pub unique_domains: usize,
    pub unique_sources: usize,
    pub avg_quality: Option<f64>,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainBreakdown {
    pub domain: String,
    pub articles: usize,
    pub unique_sources: usize,
    pub avg_quality: Option<f64>,
    pub avg_content_length: f64,
    /// Share of all domain-bearing articles, one decimal. Shares are
    /// apportioned to total exactly 100.0, so a value may differ from its
    /// plainly rounded share by 0.1.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceBreakdown {
    pub source: String,
    pub articles: usize,
    pub unique_domains: usize,
    pub avg_quality: Option<f64>,
    pub percentage: f64,
}

/// Groups records by key, skipping records without one. Groups come back
/// sorted by size, largest first; equal sizes keep first-appearance order.
pub fn group_by<'a, K, F>(records: &'a RecordSet, key: F) -> Vec<(K, Vec<&'a ArticleRecord>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&'a ArticleRecord) -> Option<K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&ArticleRecord>)> = Vec::new();
    for record in records {
        let Some(k) = key(record) else {
            continue;
        };
        match index.get(&k) {
            Some(&i) => groups[i].1.push(record),
            None => {
                index.insert(k.clone(), groups.len());
                groups.push((k, vec![record]));
            }
        }
    }
    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    groups
}

/// Shares of `counts` in percent with one decimal, apportioned by largest
/// remainder so the result always sums to exactly 100.0 (or is empty).
pub fn percentages(counts: &[usize]) -> Vec<f64> {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return vec![0.0; counts.len()];
    }
    let mut tenths: Vec<usize> = counts.iter().map(|c| c * 1000 / total).collect();
    let mut by_remainder: Vec<(usize, usize)> = counts
        .iter()
        .enumerate()
        .map(|(i, c)| (i, c * 1000 % total))
        .collect();
    by_remainder.sort_by(|a, b| b.1.cmp(&a.1));
    let leftover = 1000 - tenths.iter().sum::<usize>();
    for (i, _) in by_remainder.into_iter().take(leftover) {
        tenths[i] += 1;
    }
    tenths.into_iter().map(|t| t as f64 / 10.0).collect()
}

fn avg_quality(members: &[&ArticleRecord]) -> Option<f64> {
    let scores: Vec<f64> = members.iter().filter_map(|r| r.quality_score()).collect();
    mean(&scores).map(|m| round_to(m, 3))
}

fn distinct<'a, F>(members: &[&'a ArticleRecord], key: F) -> usize
where
    F: Fn(&'a ArticleRecord) -> Option<&'a str>,
{
    members.iter().filter_map(|r| key(*r)).collect::<HashSet<_>>().len()
}

fn shares<K>(groups: &[(K, Vec<&ArticleRecord>)]) -> Vec<f64> {
    let counts: Vec<usize> = groups.iter().map(|(_, m)| m.len()).collect();
    percentages(&counts)
}

pub fn daily_counts(records: &RecordSet) -> Vec<DailyCount> {
    let groups = group_by(records, |r| r.date());
    let pct = shares(&groups);
    groups
        .into_iter()
        .zip(pct)
        .map(|((date, members), percentage)| DailyCount {
            date,
            articles: members.len(),
            unique_domains: distinct(&members, |r| r.domain()),
            unique_sources: distinct(&members, |r| r.source()),
            avg_quality: avg_quality(&members),
            percentage,
        })
        .collect()
}

pub fn domain_breakdown(records: &RecordSet) -> Vec<DomainBreakdown> {
    let groups = group_by(records, |r| r.domain().map(str::to_string));
    let pct = shares(&groups);
    groups
        .into_iter()
        .zip(pct)
        .map(|((domain, members), percentage)| {
            let lengths: Vec<f64> = members
                .iter()
                .map(|r| r.derived().content_length as f64)
                .collect();
            DomainBreakdown {
                domain,
                articles: members.len(),
                unique_sources: distinct(&members, |r| r.source()),
                avg_quality: avg_quality(&members),
                avg_content_length: mean(&lengths).map(|m| round_to(m, 3)).unwrap_or(0.0),
                percentage,
            }
        })
        .collect()
}

pub fn source_breakdown(records: &RecordSet) -> Vec<SourceBreakdown> {
    let groups = group_by(records, |r| r.source().map(str::to_string));
    let pct = shares(&groups);
    groups
        .into_iter()
        .zip(pct)
        .map(|((source, members), percentage)| SourceBreakdown {
            source,
            articles: members.len(),
            unique_domains: distinct(&members, |r| r.domain()),
            avg_quality: avg_quality(&members),
            percentage,
        })
        .collect()
}
