use crate::config::SimilarityBounds;
use crate::models::ArticleRecord;
use std::cmp::Ordering;
use tracing::warn;

/// `1 - distance`, bounded according to the configured metric assumption.
pub fn similarity_from_distance(distance: f64, bounds: SimilarityBounds) -> f64 {
    let similarity = 1.0 - distance;
    match bounds {
        SimilarityBounds::Raw => similarity,
        SimilarityBounds::UnitClamped => {
            if !(0.0..=1.0).contains(&distance) {
                warn!(distance, "distance outside [0, 1] with unit_clamped similarity");
            }
            similarity.clamp(0.0, 1.0)
        }
    }
}

/// Stable sort by descending similarity; records without one go last.
pub fn rank_by_similarity(records: &mut [ArticleRecord]) {
    records.sort_by(|a, b| match (a.similarity(), b.similarity()) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ArticleFields;

    fn scored(title: &str, similarity: Option<f64>) -> ArticleRecord {
        ArticleRecord::new(ArticleFields {
            title: title.into(),
            ..Default::default()
        })
        .with_similarity(similarity)
    }

    #[test]
    fn raw_bounds_do_not_clamp() {
        assert!((similarity_from_distance(0.25, SimilarityBounds::Raw) - 0.75).abs() < 1e-12);
        assert!((similarity_from_distance(1.6, SimilarityBounds::Raw) + 0.6).abs() < 1e-12);
    }

    #[test]
    fn unit_bounds_clamp() {
        assert_eq!(similarity_from_distance(1.6, SimilarityBounds::UnitClamped), 0.0);
        assert_eq!(similarity_from_distance(-0.2, SimilarityBounds::UnitClamped), 1.0);
    }

    #[test]
    fn ranking_is_stable_and_puts_unscored_last() {
        let mut records = vec![
            scored("a", Some(0.5)),
            scored("b", None),
            scored("c", Some(0.9)),
            scored("d", Some(0.5)),
        ];
        rank_by_similarity(&mut records);
        let titles: Vec<&str> = records.iter().map(|r| r.raw().title.as_str()).collect();
        assert_eq!(titles, vec!["c", "a", "d", "b"]);
    }
}
