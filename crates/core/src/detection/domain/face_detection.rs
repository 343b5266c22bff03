use crate::detection::domain::face_landmarks::FaceLandmarks;

/// One detected face: box in frame pixels plus optional keypoints.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceDetection {
    /// `[x1, y1, x2, y2]`.
    pub bbox: [f64; 4],
    pub confidence: f64,
    pub landmarks: Option<FaceLandmarks>,
}

impl FaceDetection {
    pub fn width(&self) -> f64 {
        self.bbox[2] - self.bbox[0]
    }

    pub fn height(&self) -> f64 {
        self.bbox[3] - self.bbox[1]
    }

    /// Center and half-side of the square used to crop this face for
    /// embedding. Centers on the landmarks when any are visible.
    pub fn crop_square(&self) -> (f64, f64, f64) {
        let box_center = (
            (self.bbox[0] + self.bbox[2]) / 2.0,
            (self.bbox[1] + self.bbox[3]) / 2.0,
        );
        let (cx, cy) = self
            .landmarks
            .as_ref()
            .and_then(|lm| lm.center())
            .unwrap_or(box_center);
        let half = self.width().max(self.height()) / 2.0;
        (cx, cy, half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(landmarks: Option<FaceLandmarks>) -> FaceDetection {
        FaceDetection {
            bbox: [10.0, 20.0, 50.0, 80.0],
            confidence: 0.9,
            landmarks,
        }
    }

    #[test]
    fn test_dimensions() {
        let d = detection(None);
        assert_eq!(d.width(), 40.0);
        assert_eq!(d.height(), 60.0);
    }

    #[test]
    fn test_crop_square_uses_box_center_without_landmarks() {
        assert_eq!(detection(None).crop_square(), (30.0, 50.0, 30.0));
    }

    #[test]
    fn test_crop_square_prefers_landmark_center() {
        let lm = FaceLandmarks::new([(0.0, 0.0), (0.0, 0.0), (33.0, 55.0), (0.0, 0.0), (0.0, 0.0)]);
        assert_eq!(detection(Some(lm)).crop_square(), (33.0, 55.0, 30.0));
    }
}
