use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{
    EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL, YOLO_MODEL_NAME, YOLO_MODEL_URL,
};

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// A downloadable model: file name in the cache plus its release URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: &'static str,
    pub url: &'static str,
}

pub const DETECTION_MODEL: ModelSpec = ModelSpec {
    name: YOLO_MODEL_NAME,
    url: YOLO_MODEL_URL,
};

pub const EMBEDDING_MODEL: ModelSpec = ModelSpec {
    name: EMBEDDING_MODEL_NAME,
    url: EMBEDDING_MODEL_URL,
};

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Resolve a model file, checking the user cache and a bundled directory
/// before downloading into the cache.
pub fn resolve(
    spec: ModelSpec,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    resolve_in(&model_cache_dir()?, spec, bundled_dir, progress)
}

/// Same as [`resolve`] with an explicit cache directory.
pub fn resolve_in(
    cache_dir: &Path,
    spec: ModelSpec,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cached_path = cache_dir.join(spec.name);
    if cached_path.exists() {
        log::debug!("Model {} found in cache", spec.name);
        return Ok(cached_path);
    }

    if let Some(dir) = bundled_dir {
        let bundled_path = dir.join(spec.name);
        if bundled_path.exists() {
            log::debug!("Model {} found at {}", spec.name, bundled_path.display());
            return Ok(bundled_path);
        }
    }

    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading {} from {}", spec.name, spec.url);
    download(spec.url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/Facewatch/models/`
/// - Linux: `$XDG_CACHE_HOME/Facewatch/models/` or `~/.cache/Facewatch/models/`
/// - Windows: `%LOCALAPPDATA%/Facewatch/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();

    base.map(|d| d.join("Facewatch").join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let download_err = |source| ModelResolveError::Download {
        url: url.to_string(),
        source,
    };

    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(download_err)?;
    let total = response.content_length().unwrap_or(0);
    let bytes = response.bytes().map_err(download_err)?;

    // Write next to the destination and rename, so a failed download
    // never leaves a truncated model behind.
    let temp_path = dest.with_extension("part");
    let write_err = |source| ModelResolveError::Write {
        path: temp_path.clone(),
        source,
    };

    let result = (|| {
        let mut file = fs::File::create(&temp_path).map_err(write_err)?;
        let mut downloaded: u64 = 0;
        for chunk in bytes.chunks(1024 * 1024) {
            file.write_all(chunk).map_err(write_err)?;
            downloaded += chunk.len() as u64;
            if let Some(ref cb) = progress {
                cb(downloaded, total);
            }
        }
        file.flush().map_err(write_err)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, dest).map_err(|source| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TEST_MODEL: ModelSpec = ModelSpec {
        name: "test_model.onnx",
        url: "http://invalid.nonexistent.example.com/model.onnx",
    };

    #[test]
    fn test_resolve_in_prefers_cache() {
        let tmp = TempDir::new().unwrap();
        let cached = tmp.path().join(TEST_MODEL.name);
        fs::write(&cached, b"cached").unwrap();

        let bundled = tmp.path().join("bundled");
        fs::create_dir_all(&bundled).unwrap();
        fs::write(bundled.join(TEST_MODEL.name), b"bundled").unwrap();

        let path = resolve_in(tmp.path(), TEST_MODEL, Some(&bundled), None).unwrap();
        assert_eq!(path, cached);
    }

    #[test]
    fn test_resolve_in_falls_back_to_bundled() {
        let tmp = TempDir::new().unwrap();
        let cache = tmp.path().join("cache");
        let bundled = tmp.path().join("bundled");
        fs::create_dir_all(&bundled).unwrap();
        fs::write(bundled.join(TEST_MODEL.name), b"bundled").unwrap();

        let path = resolve_in(&cache, TEST_MODEL, Some(&bundled), None).unwrap();
        assert_eq!(path, bundled.join(TEST_MODEL.name));
        assert!(!cache.exists());
    }

    #[test]
    fn test_resolve_in_download_failure_leaves_no_files() {
        let tmp = TempDir::new().unwrap();
        let result = resolve_in(tmp.path(), TEST_MODEL, None, None);
        assert!(matches!(result, Err(ModelResolveError::Download { .. })));
        assert!(!tmp.path().join(TEST_MODEL.name).exists());
        assert!(!tmp.path().join("test_model.part").exists());
    }

    #[test]
    fn test_model_cache_dir_returns_path() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains("Facewatch"));
        assert!(path.ends_with("models"));
    }

    #[test]
    fn test_builtin_specs_point_at_onnx_files() {
        assert!(DETECTION_MODEL.name.ends_with(".onnx"));
        assert!(EMBEDDING_MODEL.url.ends_with(EMBEDDING_MODEL.name));
    }
}
