use std::time::Instant;

use crate::detection::domain::face_detector::FaceDetector;
use crate::identity::domain::match_result::MatchResult;
use crate::recognition::domain::face_embedder::FaceEmbedder;
use crate::recognition::domain::gallery::Gallery;
use crate::recognition::domain::gallery_matcher::GalleryMatcher;
use crate::shared::frame::Frame;

/// Inference half of the pipeline: detect, embed and match every face in a
/// frame. Holds no per-run identity state, so it may run on its own thread.
pub struct FrameAnalyzer {
    detector: Box<dyn FaceDetector>,
    embedder: Box<dyn FaceEmbedder>,
    matcher: GalleryMatcher,
    gallery: Gallery,
}

/// Matches found in one frame, or why the frame could not be analyzed.
pub struct FrameAnalysis {
    pub frame_index: usize,
    pub matches: Result<Vec<MatchResult>, String>,
    pub duration_ms: f64,
}

impl FrameAnalyzer {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        embedder: Box<dyn FaceEmbedder>,
        matcher: GalleryMatcher,
        gallery: Gallery,
    ) -> Self {
        Self {
            detector,
            embedder,
            matcher,
            gallery,
        }
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    /// Match results for every face in `frame`, in detection order.
    pub fn analyze(
        &mut self,
        frame: &Frame,
    ) -> Result<Vec<MatchResult>, Box<dyn std::error::Error>> {
        let faces = self.detector.detect(frame)?;
        let mut results = Vec::with_capacity(faces.len());
        for face in &faces {
            let embedding = self.embedder.embed(frame, face)?;
            let matched = self.matcher.best_match(&embedding, &self.gallery)?;
            results.push(MatchResult::new(embedding, matched, frame.index() as i64));
        }
        Ok(results)
    }

    /// Like [`analyze`](Self::analyze), timed and with the error flattened
    /// so the result can cross a thread boundary.
    pub fn analyze_timed(&mut self, frame: &Frame) -> FrameAnalysis {
        let start = Instant::now();
        let matches = self.analyze(frame).map_err(|e| e.to_string());
        FrameAnalysis {
            frame_index: frame.index(),
            matches,
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
        }
    }
}
