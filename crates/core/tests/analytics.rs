use chrono::{NaiveDate, TimeZone, Utc};
use newslens_core::analytics::{AnomalyMethod, Field};
use newslens_core::config::AnalyticsConfig;
use newslens_core::models::{parse_published_date, ArticleFields, ArticleRecord};
use newslens_core::{AnalyticsEngine, RecordSet};

fn article(domain: &str, source: &str, date: &str, quality: Option<f64>, content: &str) -> ArticleRecord {
    ArticleRecord::new(ArticleFields {
        title: format!("{} / {}", domain, source),
        content: content.to_string(),
        domain: Some(domain.to_string()),
        source: Some(source.to_string()),
        published_date: parse_published_date(date),
        quality_score: quality,
        ..Default::default()
    })
}

/// Three sport and two politics articles across three days of June 2024.
fn corpus() -> RecordSet {
    RecordSet::new(vec![
        article("sport", "gazzetta", "2024-06-10T09:00:00Z", Some(0.9), "Calciomercato: Inter chiude per il centrocampista"),
        article("sport", "corriere", "2024-06-10T09:45:00Z", Some(0.7), "Inter e Milan, derby del calciomercato"),
        article("politics", "ansa", "2024-06-11T18:00:00Z", Some(0.5), "Elezioni europee: affluenza in calo"),
        article("sport", "gazzetta", "2024-06-12T09:15:00Z", None, "Juventus, nuovo allenatore in arrivo"),
        article("politics", "corriere", "2024-06-12T21:00:00Z", Some(0.6), "Governo e opposizione dopo le elezioni"),
    ])
}

#[test]
fn domain_breakdown_shares_follow_counts() {
    let engine = AnalyticsEngine::new(corpus());
    let breakdown = engine.domain_breakdown();
    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown[0].domain, "sport");
    assert_eq!(breakdown[0].articles, 3);
    assert_eq!(breakdown[0].percentage, 60.0);
    assert_eq!(breakdown[0].unique_sources, 2);
    assert_eq!(breakdown[0].avg_quality, Some(0.8));
    assert_eq!(breakdown[1].domain, "politics");
    assert_eq!(breakdown[1].percentage, 40.0);
}

#[test]
fn summary_counts_every_record() {
    let now = Utc.with_ymd_and_hms(2024, 6, 12, 23, 0, 0).unwrap();
    let engine = AnalyticsEngine::new(corpus());
    let stats = engine.summary_stats_at(now);

    assert_eq!(stats.total_articles, engine.len());
    assert_eq!(stats.unique_domains, 2);
    assert_eq!(stats.unique_sources, 3);

    let range = stats.date_range.unwrap();
    assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
    assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 6, 12).unwrap());
    assert_eq!(range.days_covered, 3);

    let recency = stats.recency.unwrap();
    assert_eq!(recency.today, 2);
    assert_eq!(recency.last_7_days, 5);
    assert_eq!(recency.last_30_days, 5);

    let quality = stats.quality.unwrap();
    assert_eq!(quality.count, 4);
    assert!((quality.mean - 0.675).abs() < 1e-9);
    assert!((quality.median - 0.65).abs() < 1e-9);
    assert_eq!(quality.min, 0.5);
    assert_eq!(quality.max, 0.9);

    assert_eq!(stats.top_domains[0].key, "sport");
    assert_eq!(stats.top_domains[0].count, 3);
}

#[test]
fn daily_counts_are_sorted_by_volume() {
    let daily = AnalyticsEngine::new(corpus()).daily_counts();
    let days: Vec<(u32, usize)> = daily
        .iter()
        .map(|d| (chrono::Datelike::day(&d.date), d.articles))
        .collect();
    assert_eq!(days, vec![(10, 2), (12, 2), (11, 1)]);
    let total: f64 = daily.iter().map(|d| d.percentage).sum();
    assert!((total - 100.0).abs() < 1e-9);
    assert_eq!(daily[1].avg_quality, Some(0.6));
}

#[test]
fn filters_return_new_engines() {
    let engine = AnalyticsEngine::new(corpus());

    let sport = engine.by_domain(&["sport"]);
    assert_eq!(sport.len(), 3);
    assert_eq!(engine.len(), 5);
    assert_eq!(sport.by_domain(&["sport"]).records(), sport.records());

    assert_eq!(engine.by_source(&["gazzetta", "ansa"]).len(), 3);

    let june_11 = NaiveDate::from_ymd_opt(2024, 6, 11).unwrap();
    let june_12 = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
    assert_eq!(engine.by_date_range(june_11, june_12).len(), 3);
    assert_eq!(engine.by_date_range(june_12, june_11).len(), 0);

    let good = engine.by_quality_range(0.6, 1.0);
    assert_eq!(good.len(), 3);
    assert!(good.records().iter().all(|r| r.quality_score().unwrap() >= 0.6));
}

#[test]
fn keywords_are_deterministic_and_skip_stopwords() {
    let engine = AnalyticsEngine::new(corpus());
    let first = engine.top_keywords(5);
    let second = engine.top_keywords(5);
    assert_eq!(first, second);
    assert_eq!(first[0].word, "calciomercato");
    assert_eq!(first[0].count, 2);
    assert_eq!(first[1].word, "inter");
    let all = engine.top_keywords(100);
    assert!(all.iter().all(|k| k.word != "dopo"));
    assert!(all.iter().all(|k| k.word.chars().count() > 3));
}

#[test]
fn custom_stopwords_are_honoured() {
    let cfg = AnalyticsConfig {
        stopwords: vec!["Calciomercato".to_string()],
        ..AnalyticsConfig::default()
    };
    let engine = AnalyticsEngine::with_config(corpus(), &cfg);
    let keywords = engine.top_keywords(3);
    assert!(keywords.iter().all(|k| k.word != "calciomercato"));
    assert_eq!(keywords[0].word, "inter");
}

#[test]
fn publication_patterns_over_corpus() {
    let patterns = AnalyticsEngine::new(corpus()).publication_patterns();
    assert_eq!(patterns.peak_hour, Some(9));
    // 2024-06-10 is a Monday.
    assert_eq!(patterns.most_active_day, Some("Monday"));
    assert_eq!(patterns.monthly_distribution.get(&6), Some(&5));
    let days: Vec<&str> = patterns
        .weekday_distribution
        .iter()
        .map(|w| w.weekday)
        .collect();
    assert_eq!(days, vec!["Monday", "Tuesday", "Wednesday"]);
}

#[test]
fn zero_variance_has_no_anomalies() {
    let records: RecordSet = (0..6)
        .map(|_| article("sport", "ansa", "2024-06-10", Some(0.5), "uguale"))
        .collect();
    let engine = AnalyticsEngine::new(records);
    assert!(engine
        .detect_anomalies(Field::QualityScore, AnomalyMethod::ZScore, 1.0)
        .is_empty());
    assert!(engine
        .detect_anomalies(Field::Content, AnomalyMethod::Length, 1.0)
        .is_empty());
}

#[test]
fn length_anomalies_flag_outlying_content() {
    let mut records: Vec<ArticleRecord> = (0..10)
        .map(|i| article("sport", "ansa", "2024-06-10", None, &"x".repeat(100 + i)))
        .collect();
    records.push(article("sport", "ansa", "2024-06-10", None, &"x".repeat(5000)));
    let engine = AnalyticsEngine::new(RecordSet::new(records));
    let flagged = engine.detect_anomalies(Field::Content, AnomalyMethod::Length, 2.0);
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged.records()[0].derived().content_length, 5000);
}

#[test]
fn report_bundles_every_section() {
    let now = Utc.with_ymd_and_hms(2024, 6, 12, 23, 0, 0).unwrap();
    let engine = AnalyticsEngine::new(corpus());
    let report = engine.summary_report_at(now);
    assert_eq!(report.timestamp, now);
    assert_eq!(report.summary_stats, engine.summary_stats_at(now));
    assert_eq!(report.domain_breakdown, engine.domain_breakdown());
    assert_eq!(report.source_breakdown.len(), 3);
    assert_eq!(report.top_keywords, engine.top_keywords(20));

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["publication_patterns"]["hourly_distribution"].is_object());
    assert_eq!(json["summary_stats"]["total_articles"], 5);
}

#[test]
fn report_truncates_sources_to_ten_rows() {
    let records: RecordSet = (0..15)
        .map(|i| article("sport", &format!("source-{}", i), "2024-06-10", None, "testo"))
        .collect();
    let report = AnalyticsEngine::new(records).summary_report();
    assert_eq!(report.source_breakdown.len(), 10);
}

#[test]
fn empty_engine_is_safe_everywhere() {
    let engine = AnalyticsEngine::new(RecordSet::default());
    let stats = engine.summary_stats();
    assert_eq!(stats.total_articles, 0);
    assert!(stats.date_range.is_none());
    assert!(stats.recency.is_none());
    assert!(stats.quality.is_none());
    assert!(engine.daily_counts().is_empty());
    assert!(engine.domain_breakdown().is_empty());
    assert!(engine.source_breakdown().is_empty());
    assert!(engine.top_keywords(10).is_empty());
    assert!(engine.publication_patterns().is_empty());
    assert!(engine
        .detect_anomalies(Field::QualityScore, AnomalyMethod::ZScore, 3.0)
        .is_empty());
    let report = engine.summary_report();
    assert!(report.domain_breakdown.is_empty());
}
