use std::sync::atomic::Ordering;

use crate::identity::domain::consolidator_session::ConsolidatorSession;
use crate::pipeline::frame_analyzer::FrameAnalyzer;
use crate::pipeline::pipeline_executor::{
    consolidate_frame, end_of_stream, report_progress, PipelineConfig, PipelineExecutor, PipelineOutcome,
};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

/// Runs read → analyze → consolidate for one frame at a time on the
/// calling thread.
#[derive(Default)]
pub struct SequentialPipelineExecutor;

impl SequentialPipelineExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl PipelineExecutor for SequentialPipelineExecutor {
    fn execute(
        &self,
        mut reader: Box<dyn VideoReader>,
        mut analyzer: FrameAnalyzer,
        session: &mut ConsolidatorSession,
        metadata: &VideoMetadata,
        config: PipelineConfig,
        logger: &mut dyn PipelineLogger,
    ) -> Result<PipelineOutcome, Box<dyn std::error::Error>> {
        let mut outcome = PipelineOutcome::default();

        for frame_result in reader.frames() {
            if config.cancelled.load(Ordering::Relaxed) {
                outcome.cancelled = true;
                break;
            }
            let frame = match frame_result {
                Ok(frame) => frame,
                Err(e) => {
                    end_of_stream(&e, &mut outcome, logger);
                    break;
                }
            };
            let analysis = analyzer.analyze_timed(&frame);
            consolidate_frame(session, analysis, &mut outcome, logger);
            if !report_progress(&config, &mut outcome, metadata.total_frames, logger) {
                break;
            }
        }

        reader.close();
        Ok(outcome)
    }
}
