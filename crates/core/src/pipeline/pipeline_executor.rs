use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use crate::identity::domain::consolidator_session::ConsolidatorSession;
use crate::pipeline::frame_analyzer::{FrameAnalysis, FrameAnalyzer};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Progress callback: `(frames_done, total_frames) -> keep_going`.
pub type ProgressFn = Box<dyn Fn(usize, usize) -> bool + Send>;

/// Configuration for a pipeline execution run.
pub struct PipelineConfig {
    pub on_progress: Option<ProgressFn>,
    pub cancelled: Arc<AtomicBool>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// What a run got through before it finished or was stopped.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineOutcome {
    pub frames_read: usize,
    pub frames_skipped: usize,
    pub cancelled: bool,
    /// Set when the reader failed mid-stream; the run ended at that point.
    pub decode_error: Option<String>,
}

/// Abstracts how the read → analyze → consolidate pipeline is executed.
///
/// Implementations may overlap reading and inference, but must feed
/// `session` one frame at a time in decode order.
pub trait PipelineExecutor: Send {
    fn execute(
        &self,
        reader: Box<dyn VideoReader>,
        analyzer: FrameAnalyzer,
        session: &mut ConsolidatorSession,
        metadata: &VideoMetadata,
        config: PipelineConfig,
        logger: &mut dyn PipelineLogger,
    ) -> Result<PipelineOutcome, Box<dyn std::error::Error>>;
}

/// Folds one analyzed frame into `session`.
///
/// A frame whose analysis failed, or that holds a malformed observation, is
/// skipped with a warning; the session is left as it was.
pub(crate) fn consolidate_frame(
    session: &mut ConsolidatorSession,
    analysis: FrameAnalysis,
    outcome: &mut PipelineOutcome,
    logger: &mut dyn PipelineLogger,
) {
    outcome.frames_read += 1;
    logger.timing("analyze", analysis.duration_ms);

    let matches = match analysis.matches {
        Ok(matches) => matches,
        Err(e) => {
            outcome.frames_skipped += 1;
            logger.warn(&format!("Frame {}: {e}. Skipping...", analysis.frame_index));
            return;
        }
    };

    logger.metric("faces", matches.len() as f64);
    let start = Instant::now();
    if let Err(e) = session.observe_frame(&matches) {
        outcome.frames_skipped += 1;
        logger.warn(&format!("Frame {}: {e}. Skipping...", analysis.frame_index));
    }
    logger.timing("consolidate", start.elapsed().as_secs_f64() * 1000.0);
}

/// Treats a reader failure as the end of the stream. Frames consolidated so
/// far are kept.
pub(crate) fn end_of_stream(
    error: &dyn std::fmt::Display,
    outcome: &mut PipelineOutcome,
    logger: &mut dyn PipelineLogger,
) {
    logger.warn(&format!(
        "Decode failed after {} frames: {error}. Ending stream...",
        outcome.frames_read
    ));
    outcome.decode_error = Some(error.to_string());
}

/// Reports progress and returns `false` once the run should stop.
pub(crate) fn report_progress(
    config: &PipelineConfig,
    outcome: &mut PipelineOutcome,
    total_frames: usize,
    logger: &mut dyn PipelineLogger,
) -> bool {
    logger.progress(outcome.frames_read, total_frames);
    if let Some(ref callback) = config.on_progress {
        if !callback(outcome.frames_read, total_frames) {
            outcome.cancelled = true;
            return false;
        }
    }
    true
}
