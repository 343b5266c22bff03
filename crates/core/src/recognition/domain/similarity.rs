use crate::recognition::domain::embedding::{Embedding, EmbeddingError};

/// Scores how alike two embeddings are. Higher means more similar.
///
/// Implementations must be symmetric and pure, and their scale must agree
/// with the gallery acceptance threshold (`score > threshold`).
pub trait SimilarityComparator: Send + Sync {
    fn compare(&self, a: &Embedding, b: &Embedding) -> Result<f64, EmbeddingError>;
}

/// Cosine similarity in [-1, 1].
///
/// With `dimension` set, both inputs must have exactly that length;
/// otherwise they only have to agree with each other.
#[derive(Clone, Copy, Debug, Default)]
pub struct CosineSimilarity {
    dimension: Option<usize>,
}

impl CosineSimilarity {
    pub fn new() -> Self {
        Self { dimension: None }
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: Some(dimension),
        }
    }

    fn check(&self, a: &Embedding, b: &Embedding) -> Result<(), EmbeddingError> {
        if a.dim() == 0 || b.dim() == 0 {
            return Err(EmbeddingError::Empty);
        }
        let expected = self.dimension.unwrap_or(a.dim());
        for actual in [a.dim(), b.dim()] {
            if actual != expected {
                return Err(EmbeddingError::DimensionMismatch { expected, actual });
            }
        }
        Ok(())
    }
}

impl SimilarityComparator for CosineSimilarity {
    fn compare(&self, a: &Embedding, b: &Embedding) -> Result<f64, EmbeddingError> {
        self.check(a, b)?;

        let mut dot = 0.0f64;
        let mut norm_a = 0.0f64;
        let mut norm_b = 0.0f64;
        for (x, y) in a.values().iter().zip(b.values()) {
            let (x, y) = (*x as f64, *y as f64);
            dot += x * y;
            norm_a += x * x;
            norm_b += y * y;
        }

        let denom = norm_a.sqrt() * norm_b.sqrt();
        Ok(if denom > 0.0 { dot / denom } else { 0.0 })
    }
}
