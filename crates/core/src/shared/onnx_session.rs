use std::path::Path;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;

/// Platform-preferred ONNX execution providers. An empty list means the
/// default CPU provider.
fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

/// Builds an inference session for `model_path` using every available core.
///
/// Both the detector and the embedder load through here so they share one
/// execution-provider policy.
pub fn load_session(model_path: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    if !model_path.exists() {
        return Err(format!("Model file not found: {}", model_path.display()).into());
    }

    let intra_threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_inter_threads(1)?
        .with_intra_threads(intra_threads)?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(model_path)?;

    log::debug!(
        "Loaded {} ({} inputs, {} outputs)",
        model_path.display(),
        session.inputs().len(),
        session.outputs().len()
    );
    Ok(session)
}
