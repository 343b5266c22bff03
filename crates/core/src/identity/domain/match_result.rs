use thiserror::Error;

use crate::recognition::domain::embedding::{Embedding, EmbeddingError};
use crate::recognition::domain::gallery_matcher::GalleryMatch;
use crate::shared::constants::UNKNOWN_LABEL;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObservationError {
    #[error("frame index must be non-negative, got {0}")]
    NegativeFrameIndex(i64),
    #[error("match score must be finite, got {0}")]
    NonFiniteScore(f64),
    #[error("observation for frame {frame_index} arrived after frame {last_frame}")]
    OutOfOrder { frame_index: i64, last_frame: i64 },
    #[error("observed embedding: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// One detected face in one frame, after gallery matching.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    pub embedding: Embedding,
    pub label: String,
    pub score: f64,
    pub frame_index: i64,
}

impl MatchResult {
    pub fn new(embedding: Embedding, matched: GalleryMatch, frame_index: i64) -> Self {
        Self {
            embedding,
            label: matched.label,
            score: matched.score,
            frame_index,
        }
    }

    pub fn is_known(&self) -> bool {
        self.label != UNKNOWN_LABEL
    }

    /// Checks the fields that would corrupt aggregate state if accepted.
    pub fn validate(&self) -> Result<(), ObservationError> {
        if self.frame_index < 0 {
            return Err(ObservationError::NegativeFrameIndex(self.frame_index));
        }
        if !self.score.is_finite() {
            return Err(ObservationError::NonFiniteScore(self.score));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn result(score: f64, frame_index: i64) -> MatchResult {
        MatchResult::new(
            Embedding::new(vec![1.0]),
            GalleryMatch::unknown(score),
            frame_index,
        )
    }

    #[test]
    fn test_new_copies_match_outcome() {
        let m = MatchResult::new(
            Embedding::new(vec![1.0]),
            GalleryMatch {
                label: "alice".into(),
                score: 0.7,
            },
            4,
        );
        assert!(m.is_known());
        assert_eq!(m.label, "alice");
        assert_eq!(m.frame_index, 4);
    }

    #[test]
    fn test_valid_observation_passes() {
        assert!(result(0.3, 0).validate().is_ok());
    }

    #[rstest]
    #[case::negative_frame(result(0.3, -1), ObservationError::NegativeFrameIndex(-1))]
    #[case::infinite_score(result(f64::INFINITY, 2), ObservationError::NonFiniteScore(f64::INFINITY))]
    fn test_invalid_observations(#[case] m: MatchResult, #[case] expected: ObservationError) {
        assert_eq!(m.validate(), Err(expected));
    }

    #[test]
    fn test_nan_score_rejected() {
        assert!(matches!(
            result(f64::NAN, 0).validate(),
            Err(ObservationError::NonFiniteScore(_))
        ));
    }
}
