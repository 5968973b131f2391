use cli::narrow::{parse_day, Narrowing};
use newslens_core::models::{parse_published_date, ArticleFields, ArticleRecord};
use newslens_core::{AnalyticsEngine, RecordSet};

fn engine() -> AnalyticsEngine {
    let rows = [
        ("sport", "ansa", "2024-06-01T08:00:00Z", Some(0.9)),
        ("sport", "gazzetta", "2024-06-05T08:00:00Z", Some(0.4)),
        ("politica", "ansa", "2024-06-09T08:00:00Z", None),
    ];
    let records: RecordSet = rows
        .iter()
        .map(|(domain, source, date, quality)| {
            ArticleRecord::new(ArticleFields {
                domain: Some(domain.to_string()),
                source: Some(source.to_string()),
                published_date: parse_published_date(date),
                quality_score: *quality,
                ..Default::default()
            })
        })
        .collect();
    AnalyticsEngine::new(records)
}

#[test]
fn default_narrowing_keeps_everything() {
    let narrowed = Narrowing::default().apply(engine()).unwrap();
    assert_eq!(narrowed.len(), 3);
}

#[test]
fn filters_compose() {
    let narrowing = Narrowing {
        sources: vec!["ansa".into()],
        since: Some("2024-06-01".into()),
        until: Some("2024-06-05".into()),
        ..Default::default()
    };
    let narrowed = narrowing.apply(engine()).unwrap();
    assert_eq!(narrowed.len(), 1);
    assert_eq!(narrowed.records().records()[0].domain(), Some("sport"));
}

#[test]
fn open_quality_bound_drops_unscored() {
    let narrowing = Narrowing {
        min_quality: Some(0.5),
        ..Default::default()
    };
    assert_eq!(narrowing.apply(engine()).unwrap().len(), 1);
}

#[test]
fn inverted_or_malformed_dates_are_errors() {
    let inverted = Narrowing {
        since: Some("2024-06-09".into()),
        until: Some("2024-06-01".into()),
        ..Default::default()
    };
    assert!(inverted.apply(engine()).is_err());
    assert!(parse_day("09/06/2024").is_err());
}
