use crate::detection::domain::face_detection::FaceDetection;
use crate::shared::frame::Frame;

/// Domain interface for face detection.
///
/// Returns faces ordered by descending confidence. `&mut self` because
/// inference sessions need exclusive access.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>>;
}
