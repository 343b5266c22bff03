use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::identity::domain::consolidator_session::ConsolidatorSession;
use crate::pipeline::frame_analyzer::{FrameAnalysis, FrameAnalyzer};
use crate::pipeline::pipeline_executor::{
    consolidate_frame, end_of_stream, report_progress, PipelineConfig, PipelineExecutor, PipelineOutcome,
};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Executes the pipeline with dedicated threads for decoding and inference.
///
/// Layout: `reader → analyze → main [consolidate]`
///
/// Decoding and inference overlap; consolidation stays on the calling
/// thread and receives frames in the order the reader produced them, since
/// both channels are FIFO with a single producer.
pub struct ThreadedPipelineExecutor {
    channel_capacity: usize,
}

impl ThreadedPipelineExecutor {
    pub fn new() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_capacity(channel_capacity: usize) -> Self {
        Self {
            channel_capacity: channel_capacity.max(1),
        }
    }
}

impl Default for ThreadedPipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineExecutor for ThreadedPipelineExecutor {
    fn execute(
        &self,
        reader: Box<dyn VideoReader>,
        analyzer: FrameAnalyzer,
        session: &mut ConsolidatorSession,
        metadata: &VideoMetadata,
        config: PipelineConfig,
        logger: &mut dyn PipelineLogger,
    ) -> Result<PipelineOutcome, Box<dyn std::error::Error>> {
        let cap = self.channel_capacity;
        // Private stop flag so a failing or cancelled main loop also halts
        // the worker threads without touching the caller's flag.
        let stop = Arc::new(AtomicBool::new(false));

        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Result<Frame, SendError>>(cap);
        let (analyzed_tx, analyzed_rx) =
            crossbeam_channel::bounded::<Result<FrameAnalysis, SendError>>(cap);

        let reader_handle = spawn_reader(reader, frame_tx, stop.clone());
        let analyze_handle = spawn_analyzer(analyzer, frame_rx, analyzed_tx, stop.clone());

        let mut outcome = PipelineOutcome::default();
        run_main_loop(
            analyzed_rx,
            session,
            metadata.total_frames,
            &config,
            &mut outcome,
            logger,
        );
        stop.store(true, Ordering::Relaxed);

        join_threads(reader_handle, analyze_handle).map(|()| outcome)
    }
}

fn spawn_reader(
    mut reader: Box<dyn VideoReader>,
    frame_tx: crossbeam_channel::Sender<Result<Frame, SendError>>,
    stop: Arc<AtomicBool>,
) -> std::thread::JoinHandle<Box<dyn VideoReader>> {
    std::thread::spawn(move || {
        for frame_result in reader.frames() {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            let mapped = frame_result.map_err(|e| -> SendError { e.to_string().into() });
            let failed = mapped.is_err();
            if frame_tx.send(mapped).is_err() || failed {
                break;
            }
        }
        reader.close();
        reader
    })
}

fn spawn_analyzer(
    mut analyzer: FrameAnalyzer,
    frame_rx: crossbeam_channel::Receiver<Result<Frame, SendError>>,
    analyzed_tx: crossbeam_channel::Sender<Result<FrameAnalysis, SendError>>,
    stop: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        for frame_result in frame_rx {
            if stop.load(Ordering::Relaxed) {
                break;
            }
            let result = frame_result.map(|frame| analyzer.analyze_timed(&frame));
            if analyzed_tx.send(result).is_err() {
                break;
            }
        }
    })
}

/// Consolidates analyzed frames as they arrive. A reader error forwarded
/// through the channel ends the stream; frames queued before it are already
/// consolidated since the channels are FIFO.
fn run_main_loop(
    analyzed_rx: crossbeam_channel::Receiver<Result<FrameAnalysis, SendError>>,
    session: &mut ConsolidatorSession,
    total_frames: usize,
    config: &PipelineConfig,
    outcome: &mut PipelineOutcome,
    logger: &mut dyn PipelineLogger,
) {
    for analyzed in &analyzed_rx {
        if config.cancelled.load(Ordering::Relaxed) {
            outcome.cancelled = true;
            break;
        }

        let analysis = match analyzed {
            Ok(analysis) => analysis,
            Err(e) => {
                end_of_stream(&e, outcome, logger);
                break;
            }
        };

        logger.metric("queue_depth", analyzed_rx.len() as f64);
        consolidate_frame(session, analysis, outcome, logger);

        if !report_progress(config, outcome, total_frames, logger) {
            break;
        }
    }
}

/// Joins the worker threads. A panicked worker is the only failure left at
/// this point.
fn join_threads(
    reader_handle: std::thread::JoinHandle<Box<dyn VideoReader>>,
    analyze_handle: std::thread::JoinHandle<()>,
) -> Result<(), Box<dyn std::error::Error>> {
    // The analyzer exits first so a reader blocked on a full channel sees
    // the disconnect.
    let analyze_panicked = analyze_handle.join().is_err();
    let reader_panicked = reader_handle.join().is_err();

    if analyze_panicked {
        return Err("Analyze thread panicked".into());
    }
    if reader_panicked {
        return Err("Reader thread panicked".into());
    }
    Ok(())
}
