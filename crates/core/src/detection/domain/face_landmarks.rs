//! Five-point facial keypoints as emitted by the pose-style detector.
//!
//! Order: left eye, right eye, nose, left mouth corner, right mouth corner.

/// Weights favor the nose, the most stable anchor across head turns.
const WEIGHTS: [f64; 5] = [2.0, 2.0, 3.0, 1.0, 1.0];

#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarks {
    /// Points with x <= 0 were below the keypoint confidence cut.
    points: [(f64, f64); 5],
}

impl FaceLandmarks {
    pub fn new(points: [(f64, f64); 5]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64); 5] {
        &self.points
    }

    pub fn visible_count(&self) -> usize {
        self.points.iter().filter(|(x, _)| *x > 0.0).count()
    }

    /// Weighted centroid of the visible points.
    pub fn center(&self) -> Option<(f64, f64)> {
        let (wx, wy, w) = self
            .points
            .iter()
            .zip(WEIGHTS)
            .filter(|((x, _), _)| *x > 0.0)
            .fold((0.0, 0.0, 0.0), |(wx, wy, ws), ((x, y), w)| {
                (wx + x * w, wy + y * w, ws + w)
            });
        (w > 0.0).then(|| (wx / w, wy / w))
    }
}
