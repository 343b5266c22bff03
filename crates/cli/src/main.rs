use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use facewatch_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use facewatch_core::identity::domain::consolidator_session::MergePolicy;
use facewatch_core::identity::domain::report_writer::ReportWriter;
use facewatch_core::identity::infrastructure::json_lookup_loader;
use facewatch_core::identity::infrastructure::json_report_writer::{
    metadata_path_for, JsonReportWriter,
};
use facewatch_core::pipeline::frame_analyzer::FrameAnalyzer;
use facewatch_core::pipeline::identify_faces_use_case::{IdentifyFacesUseCase, PipelineError};
use facewatch_core::pipeline::infrastructure::sequential_pipeline_executor::SequentialPipelineExecutor;
use facewatch_core::pipeline::infrastructure::threaded_pipeline_executor::ThreadedPipelineExecutor;
use facewatch_core::pipeline::pipeline_executor::{PipelineExecutor, ProgressFn};
use facewatch_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facewatch_core::recognition::domain::gallery_matcher::GalleryMatcher;
use facewatch_core::recognition::domain::similarity::CosineSimilarity;
use facewatch_core::recognition::infrastructure::image_gallery_loader::ImageGalleryLoader;
use facewatch_core::recognition::infrastructure::onnx_arcface_embedder::OnnxArcFaceEmbedder;
use facewatch_core::shared::config::{MergeStrategy, RecognitionConfig};
use facewatch_core::shared::constants::EMBEDDING_DIM;
use facewatch_core::shared::model_resolver::{self, ModelSpec, DETECTION_MODEL, EMBEDDING_MODEL};
use facewatch_core::video::infrastructure::ffmpeg_reader::FfmpegReader;

/// Identify known people in a video and report who appeared.
#[derive(Parser, Debug)]
#[command(name = "facewatch")]
struct Cli {
    /// Input video file.
    source: PathBuf,

    /// Report path (default: <input stem>_metadata.json next to the input).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Directory of reference face images, one person per file.
    #[arg(long, default_value = "faces")]
    faces_dir: PathBuf,

    /// JSON file mapping external ids to display names.
    #[arg(long)]
    lookup: Option<PathBuf>,

    /// Minimum similarity for a gallery match (-1.0 to 1.0).
    #[arg(long)]
    similarity_thresh: Option<f64>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence_thresh: Option<f64>,

    /// Score tolerance for folding unknown faces together (0.0-1.0).
    #[arg(long)]
    merge_tolerance: Option<f64>,

    /// How unknown faces are folded: confidence or centroid.
    #[arg(long)]
    merge_strategy: Option<MergeStrategy>,

    /// Maximum faces per frame, most confident first (0 = unlimited).
    #[arg(long)]
    max_num: Option<usize>,

    /// Face detection model (default: resolved from the model cache).
    #[arg(long)]
    det_weight: Option<PathBuf>,

    /// Face embedding model (default: resolved from the model cache).
    #[arg(long)]
    rec_weight: Option<PathBuf>,

    /// JSON config file; flags given on the command line take precedence.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Decode and run inference on separate threads.
    #[arg(long)]
    threaded: bool,

    /// Default log filter (RUST_LOG overrides).
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = effective_config(&cli)?;
    validate(&cli)?;

    let det_path = model_path(cli.det_weight.as_deref(), DETECTION_MODEL)?;
    let rec_path = model_path(cli.rec_weight.as_deref(), EMBEDDING_MODEL)?;
    let mut detector = OnnxYoloDetector::new(&det_path, config.detection_confidence, config.max_faces)?;
    let mut embedder = OnnxArcFaceEmbedder::new(&rec_path)?;

    let gallery = ImageGalleryLoader::new(&mut detector, &mut embedder)
        .load(&cli.faces_dir)
        .map_err(PipelineError::from)?;
    let lookup = json_lookup_loader::load_or_empty(cli.lookup.as_deref());

    let analyzer = FrameAnalyzer::new(
        Box::new(detector),
        Box::new(embedder),
        GalleryMatcher::new(
            CosineSimilarity::with_dimension(EMBEDDING_DIM),
            config.similarity_threshold,
        ),
        gallery,
    );
    let executor: Box<dyn PipelineExecutor> = if cli.threaded {
        Box::new(ThreadedPipelineExecutor::new())
    } else {
        Box::new(SequentialPipelineExecutor::new())
    };
    let progress: ProgressFn = Box::new(|current, total| {
        if total > 0 {
            eprint!("\rProcessing frame {current}/{total}");
        } else {
            eprint!("\rProcessing frame {current}");
        }
        true
    });

    let mut use_case = IdentifyFacesUseCase::new(
        Box::new(FfmpegReader::new()),
        analyzer,
        executor,
        MergePolicy::from_config(&config),
        lookup,
        Some(progress),
        None,
    );
    let mut logger = StdoutPipelineLogger::default();
    let run = use_case.execute(&cli.source, &mut logger)?;
    eprintln!();

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| metadata_path_for(&cli.source));
    JsonReportWriter.write(&output, &run.report)?;
    log::info!(
        "{} people in {} frames, report written to {}",
        run.report.persons.len(),
        run.report.total_frames,
        output.display()
    );
    Ok(())
}

/// Config file values (or defaults) with command-line flags applied on top.
fn effective_config(cli: &Cli) -> Result<RecognitionConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => RecognitionConfig::from_json_file(path)?,
        None => RecognitionConfig::default(),
    };

    if let Some(v) = cli.similarity_thresh {
        config.similarity_threshold = v;
    }
    if let Some(v) = cli.confidence_thresh {
        config.detection_confidence = v;
    }
    if let Some(v) = cli.merge_tolerance {
        config.merge_tolerance = v;
    }
    if let Some(v) = cli.merge_strategy {
        config.merge_strategy = v;
    }
    if let Some(v) = cli.max_num {
        config.max_faces = v;
    }

    config.validate()?;
    Ok(config)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.source.is_file() {
        return Err(format!("Input file not found: {}", cli.source.display()).into());
    }
    for path in [&cli.det_weight, &cli.rec_weight].into_iter().flatten() {
        if !path.is_file() {
            return Err(format!("Model file not found: {}", path.display()).into());
        }
    }
    Ok(())
}

fn model_path(
    explicit: Option<&Path>,
    spec: ModelSpec,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    log::info!("Resolving model: {}", spec.name);
    let name = spec.name;
    let path = model_resolver::resolve(
        spec,
        None,
        Some(Box::new(move |downloaded, total| {
            download_progress(name, downloaded, total)
        })),
    )?;
    Ok(path)
}

fn download_progress(name: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {name}... {pct}%");
    } else {
        eprint!("\rDownloading {name}... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("facewatch").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["clip.mp4"]);
        assert_eq!(cli.faces_dir, PathBuf::from("faces"));
        assert_eq!(cli.log_level, "info");
        assert!(!cli.threaded);
        assert_eq!(effective_config(&cli).unwrap(), RecognitionConfig::default());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("facewatch.json");
        fs::write(
            &config_path,
            r#"{"similarity_threshold": 0.5, "merge_tolerance": 0.1, "max_faces": 4}"#,
        )
        .unwrap();

        let cli = parse(&[
            "clip.mp4",
            "--config",
            config_path.to_str().unwrap(),
            "--similarity-thresh",
            "0.6",
            "--merge-strategy",
            "centroid",
        ]);
        let config = effective_config(&cli).unwrap();
        assert_eq!(config.similarity_threshold, 0.6);
        assert_eq!(config.merge_tolerance, 0.1);
        assert_eq!(config.max_faces, 4);
        assert_eq!(config.merge_strategy, MergeStrategy::Centroid);
    }

    #[test]
    fn test_out_of_range_flag_rejected() {
        let cli = parse(&["clip.mp4", "--confidence-thresh", "1.5"]);
        assert!(effective_config(&cli).is_err());
    }

    #[test]
    fn test_unknown_merge_strategy_rejected_by_parser() {
        let result = Cli::try_parse_from(["facewatch", "clip.mp4", "--merge-strategy", "nearest"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_source_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cli = parse(&[
            dir.path().join("absent.mp4").to_str().unwrap(),
            "--faces-dir",
            dir.path().to_str().unwrap(),
        ]);
        let err = validate(&cli).unwrap_err();
        assert!(err.to_string().contains("Input file not found"));
    }
}
