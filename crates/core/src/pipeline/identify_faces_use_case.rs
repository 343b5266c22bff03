use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use thiserror::Error;

use crate::identity::domain::consolidator_session::{ConsolidatorSession, MergePolicy};
use crate::identity::domain::label_resolver::ExternalLookup;
use crate::identity::domain::session_report::SessionReport;
use crate::identity::domain::session_reporter::summarize;
use crate::pipeline::frame_analyzer::FrameAnalyzer;
use crate::pipeline::pipeline_executor::{
    PipelineConfig, PipelineExecutor, PipelineOutcome, ProgressFn,
};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::recognition::infrastructure::image_gallery_loader::GalleryLoadError;
use crate::video::domain::video_reader::VideoReader;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("cannot open {path}: {message}")]
    ResourceUnavailable { path: PathBuf, message: String },
    #[error("pipeline already executed")]
    AlreadyExecuted,
    #[error("processing failed: {0}")]
    Execution(String),
}

impl From<GalleryLoadError> for PipelineError {
    fn from(err: GalleryLoadError) -> Self {
        match err {
            GalleryLoadError::MissingDirectory(path) => PipelineError::ResourceUnavailable {
                path,
                message: "gallery directory not found".into(),
            },
            GalleryLoadError::ReadDir { path, source } => PipelineError::ResourceUnavailable {
                path,
                message: source.to_string(),
            },
            err @ GalleryLoadError::Inference { .. } => PipelineError::Execution(err.to_string()),
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct IdentificationRun {
    pub report: SessionReport,
    pub outcome: PipelineOutcome,
    pub session: ConsolidatorSession,
}

/// Identifies and consolidates the people appearing in one video.
///
/// Opens the source, hands frames to a `PipelineExecutor` for analysis and
/// consolidation, then summarizes the session into a report. Single use:
/// `execute` consumes the reader and analyzer.
pub struct IdentifyFacesUseCase {
    reader: Option<Box<dyn VideoReader>>,
    analyzer: Option<FrameAnalyzer>,
    executor: Box<dyn PipelineExecutor>,
    policy: MergePolicy,
    lookup: ExternalLookup,
    on_progress: Option<ProgressFn>,
    cancelled: Arc<AtomicBool>,
}

impl IdentifyFacesUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reader: Box<dyn VideoReader>,
        analyzer: FrameAnalyzer,
        executor: Box<dyn PipelineExecutor>,
        policy: MergePolicy,
        lookup: ExternalLookup,
        on_progress: Option<ProgressFn>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            reader: Some(reader),
            analyzer: Some(analyzer),
            executor,
            policy,
            lookup,
            on_progress,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn execute(
        &mut self,
        input: &Path,
        logger: &mut dyn PipelineLogger,
    ) -> Result<IdentificationRun, PipelineError> {
        let mut reader = self.reader.take().ok_or(PipelineError::AlreadyExecuted)?;
        let analyzer = self.analyzer.take().ok_or(PipelineError::AlreadyExecuted)?;

        let metadata = reader
            .open(input)
            .map_err(|e| PipelineError::ResourceUnavailable {
                path: input.to_path_buf(),
                message: e.to_string(),
            })?;

        if analyzer.gallery().is_empty() {
            logger.warn("Gallery is empty; every face will be reported as Unknown");
        }
        logger.info(&format!(
            "Identifying faces in {} against {} gallery entries",
            input.display(),
            analyzer.gallery().len()
        ));

        let mut session = ConsolidatorSession::new(self.policy);
        let config = PipelineConfig {
            on_progress: self.on_progress.take(),
            cancelled: self.cancelled.clone(),
        };
        let outcome = self
            .executor
            .execute(reader, analyzer, &mut session, &metadata, config, logger)
            .map_err(|e| PipelineError::Execution(e.to_string()))?;

        if outcome.cancelled {
            logger.info(&format!("Stopped after {} frames", outcome.frames_read));
        }
        if outcome.decode_error.is_some() {
            logger.info(&format!(
                "Input ended early after {} frames; reporting what was read",
                outcome.frames_read
            ));
        }
        logger.info(&format!(
            "Processed {} frames, {} skipped, {} people tracked",
            outcome.frames_read,
            outcome.frames_skipped,
            session.len()
        ));
        logger.summary();

        let persons = summarize(session.records(), &self.lookup);
        let report = SessionReport::new(
            metadata.file_name(),
            outcome.frames_read,
            metadata.fps,
            persons,
        );

        Ok(IdentificationRun {
            report,
            outcome,
            session,
        })
    }
}
