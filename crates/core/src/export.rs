//! Flat serialisation of record sets: record-oriented JSON and row-oriented CSV.
//! Both carry the raw and derived fields.

use crate::models::{weekday_name, ArticleRecord, RecordSet};
use chrono::{NaiveDate, SecondsFormat};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

/// Writes the set as a pretty-printed JSON array; returns the record count.
pub fn to_json(records: &RecordSet, path: &Path) -> Result<usize, ExportError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(records.len())
}

const CSV_HEADER: [&str; 21] = [
    "title",
    "content",
    "domain",
    "source",
    "published_date",
    "url",
    "author",
    "quality_score",
    "keywords",
    "similarity",
    "date",
    "year",
    "month",
    "day",
    "hour",
    "weekday",
    "title_length",
    "title_word_count",
    "content_length",
    "content_word_count",
    "keywords_count",
];

/// Column order must match [`CSV_HEADER`].
#[derive(Serialize)]
struct CsvRow<'a> {
    title: &'a str,
    content: &'a str,
    domain: Option<&'a str>,
    source: Option<&'a str>,
    published_date: Option<String>,
    url: Option<&'a str>,
    author: Option<&'a str>,
    quality_score: Option<f64>,
    keywords: String,
    similarity: Option<f64>,
    date: Option<NaiveDate>,
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    weekday: Option<&'static str>,
    title_length: usize,
    title_word_count: usize,
    content_length: usize,
    content_word_count: usize,
    keywords_count: usize,
}

impl<'a> From<&'a ArticleRecord> for CsvRow<'a> {
    fn from(record: &'a ArticleRecord) -> Self {
        let raw = record.raw();
        let derived = record.derived();
        Self {
            title: &raw.title,
            content: &raw.content,
            domain: raw.domain.as_deref(),
            source: raw.source.as_deref(),
            published_date: raw
                .published_date
                .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true)),
            url: raw.url.as_deref(),
            author: raw.author.as_deref(),
            quality_score: raw.quality_score,
            keywords: raw.keywords.join(", "),
            similarity: record.similarity(),
            date: derived.date,
            year: derived.year,
            month: derived.month,
            day: derived.day,
            hour: derived.hour,
            weekday: derived.weekday.map(weekday_name),
            title_length: derived.title_length,
            title_word_count: derived.title_word_count,
            content_length: derived.content_length,
            content_word_count: derived.content_word_count,
            keywords_count: derived.keywords_count,
        }
    }
}

/// Writes one header row plus one row per record; returns the record count.
pub fn to_csv(records: &RecordSet, path: &Path) -> Result<usize, ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    if records.is_empty() {
        writer.write_record(CSV_HEADER)?;
    }
    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }
    writer.flush()?;
    Ok(records.len())
}
