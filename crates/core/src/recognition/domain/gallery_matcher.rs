use crate::recognition::domain::embedding::{Embedding, EmbeddingError};
use crate::recognition::domain::gallery::Gallery;
use crate::recognition::domain::similarity::{CosineSimilarity, SimilarityComparator};
use crate::shared::constants::UNKNOWN_LABEL;

/// Outcome of matching one detection against the gallery.
#[derive(Clone, Debug, PartialEq)]
pub struct GalleryMatch {
    /// Winning gallery label, or [`UNKNOWN_LABEL`].
    pub label: String,
    /// Accepted score for a known label. For an unknown outcome, the best
    /// positive score that stayed under the threshold (0.0 if none).
    pub score: f64,
}

impl GalleryMatch {
    pub fn unknown(score: f64) -> Self {
        Self {
            label: UNKNOWN_LABEL.to_string(),
            score,
        }
    }

    pub fn is_known(&self) -> bool {
        self.label != UNKNOWN_LABEL
    }
}

/// Linear-scan gallery matcher.
///
/// An entry qualifies when its score is strictly above both 0 and the
/// threshold. The running best only moves on strict improvement, so on
/// equal scores the entry that comes first in the gallery wins.
pub struct GalleryMatcher<C: SimilarityComparator = CosineSimilarity> {
    comparator: C,
    threshold: f64,
}

impl GalleryMatcher<CosineSimilarity> {
    pub fn cosine(threshold: f64) -> Self {
        Self::new(CosineSimilarity::new(), threshold)
    }
}

impl<C: SimilarityComparator> GalleryMatcher<C> {
    pub fn new(comparator: C, threshold: f64) -> Self {
        Self {
            comparator,
            threshold,
        }
    }

    pub fn best_match(
        &self,
        observed: &Embedding,
        gallery: &Gallery,
    ) -> Result<GalleryMatch, EmbeddingError> {
        let mut best: Option<(&str, f64)> = None;
        let mut best_rejected = 0.0f64;

        for entry in gallery.entries() {
            let score = self.comparator.compare(observed, &entry.embedding)?;
            let floor = best.map_or(0.0, |(_, s)| s);
            if score > floor && score > self.threshold {
                best = Some((entry.label.as_str(), score));
            } else if score > best_rejected {
                best_rejected = score;
            }
        }

        Ok(match best {
            Some((label, score)) => GalleryMatch {
                label: label.to_string(),
                score,
            },
            None => GalleryMatch::unknown(best_rejected),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::domain::gallery::GalleryEntry;
    use approx::assert_relative_eq;

    /// Scores each gallery embedding by its first component, ignoring the
    /// observed embedding, so tests can dictate exact scores.
    struct FixedScores;

    impl SimilarityComparator for FixedScores {
        fn compare(&self, _a: &Embedding, b: &Embedding) -> Result<f64, EmbeddingError> {
            Ok(b.values()[0] as f64)
        }
    }

    fn scored_gallery(entries: &[(&str, f32)]) -> Gallery {
        Gallery::new(
            entries
                .iter()
                .map(|(label, score)| GalleryEntry::new(*label, Embedding::new(vec![*score])))
                .collect(),
        )
    }

    fn observed() -> Embedding {
        Embedding::new(vec![1.0])
    }

    #[test]
    fn test_equal_scores_first_entry_wins() {
        let gallery = scored_gallery(&[("alice", 0.6), ("bob", 0.6)]);
        let result = GalleryMatcher::new(FixedScores, 0.4)
            .best_match(&observed(), &gallery)
            .unwrap();
        assert_eq!(result.label, "alice");
        assert_relative_eq!(result.score, 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_highest_score_wins_regardless_of_position() {
        let gallery = scored_gallery(&[("alice", 0.5), ("bob", 0.9), ("carol", 0.7)]);
        let result = GalleryMatcher::new(FixedScores, 0.4)
            .best_match(&observed(), &gallery)
            .unwrap();
        assert_eq!(result.label, "bob");
        assert!(result.is_known());
    }

    #[test]
    fn test_score_equal_to_threshold_is_rejected() {
        let gallery = scored_gallery(&[("alice", 0.5)]);
        let result = GalleryMatcher::new(FixedScores, 0.5)
            .best_match(&observed(), &gallery)
            .unwrap();
        assert!(!result.is_known());
        assert_eq!(result.label, UNKNOWN_LABEL);
        assert_relative_eq!(result.score, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_unknown_reports_best_subthreshold_score() {
        let gallery = scored_gallery(&[("alice", 0.1), ("bob", 0.3), ("carol", -0.2)]);
        let result = GalleryMatcher::new(FixedScores, 0.4)
            .best_match(&observed(), &gallery)
            .unwrap();
        assert_eq!(result.label, UNKNOWN_LABEL);
        assert_relative_eq!(result.score, 0.3, epsilon = 1e-6);
    }

    #[test]
    fn test_negative_threshold_still_requires_positive_score() {
        let gallery = scored_gallery(&[("alice", -0.1)]);
        let result = GalleryMatcher::new(FixedScores, -0.5)
            .best_match(&observed(), &gallery)
            .unwrap();
        assert_eq!(result, GalleryMatch::unknown(0.0));
    }

    #[test]
    fn test_empty_gallery_is_unknown_with_zero_score() {
        let result = GalleryMatcher::cosine(0.4)
            .best_match(&observed(), &Gallery::default())
            .unwrap();
        assert_eq!(result, GalleryMatch::unknown(0.0));
    }

    #[test]
    fn test_cosine_matcher_end_to_end() {
        let gallery = Gallery::new(vec![
            GalleryEntry::new("decoy", Embedding::new(vec![0.0, 1.0, 0.0])),
            GalleryEntry::new("match", Embedding::new(vec![1.0, 0.0, 0.0])),
        ]);
        let result = GalleryMatcher::cosine(0.4)
            .best_match(&Embedding::new(vec![1.0, 0.0, 0.0]), &gallery)
            .unwrap();
        assert_eq!(result.label, "match");
        assert_relative_eq!(result.score, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_dimension_mismatch_propagates() {
        let gallery = Gallery::new(vec![GalleryEntry::new(
            "alice",
            Embedding::new(vec![1.0, 0.0]),
        )]);
        let result = GalleryMatcher::cosine(0.4).best_match(&Embedding::new(vec![1.0]), &gallery);
        assert!(matches!(
            result,
            Err(EmbeddingError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_fixed_dimension_matcher_rejects_short_embedding() {
        let gallery = Gallery::new(vec![GalleryEntry::new(
            "alice",
            Embedding::new(vec![1.0, 0.0, 0.0]),
        )]);
        let matcher = GalleryMatcher::new(CosineSimilarity::with_dimension(3), 0.4);

        assert!(matcher
            .best_match(&Embedding::new(vec![1.0, 0.0, 0.0]), &gallery)
            .unwrap()
            .is_known());
        assert_eq!(
            matcher.best_match(&Embedding::new(vec![1.0, 0.0]), &gallery),
            Err(EmbeddingError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        );
    }
}
