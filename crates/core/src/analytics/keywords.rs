//! Plain frequency ranking of content tokens. No stemming and no TF-IDF.

use crate::models::RecordSet;
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid non-word pattern"));

/// Tokens must be longer than this many characters to count.
const MIN_TOKEN_CHARS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    pub word: String,
    pub count: usize,
}

pub fn tokenize(text: &str, stopwords: &HashSet<String>) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned = NON_WORD.replace_all(&lowered, " ");
    let tokens: Vec<String> = cleaned
        .split_whitespace()
        .filter(|t| t.chars().count() > MIN_TOKEN_CHARS && !stopwords.contains(*t))
        .map(str::to_string)
        .collect();
    tokens
}

/// Top `n` tokens across all contents by descending count; equal counts keep
/// first-occurrence order.
pub fn top_keywords(records: &RecordSet, stopwords: &HashSet<String>, n: usize) -> Vec<KeywordCount> {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut next = 0usize;
    for record in records {
        for token in tokenize(&record.raw().content, stopwords) {
            let entry = counts.entry(token).or_insert_with(|| {
                next += 1;
                (0, next)
            });
            entry.0 += 1;
        }
    }
    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked
        .into_iter()
        .take(n)
        .map(|(word, count, _)| KeywordCount { word, count })
        .collect()
}
