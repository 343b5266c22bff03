use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::detection::domain::face_detector::FaceDetector;
use crate::recognition::domain::face_embedder::FaceEmbedder;
use crate::recognition::domain::gallery::{Gallery, GalleryEntry};
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum GalleryLoadError {
    #[error("gallery directory not found: {0}")]
    MissingDirectory(PathBuf),
    #[error("failed to list gallery directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to embed reference face {path}: {message}")]
    Inference { path: PathBuf, message: String },
}

/// Builds the reference gallery from a directory of labeled face photos.
///
/// Each image contributes at most one entry, labeled with its file stem and
/// embedded from its most confident face. Files are visited in name order,
/// which fixes the matcher's tie-break order across platforms.
pub struct ImageGalleryLoader<'a> {
    detector: &'a mut dyn FaceDetector,
    embedder: &'a mut dyn FaceEmbedder,
}

impl<'a> ImageGalleryLoader<'a> {
    pub fn new(detector: &'a mut dyn FaceDetector, embedder: &'a mut dyn FaceEmbedder) -> Self {
        Self { detector, embedder }
    }

    pub fn load(&mut self, dir: &Path) -> Result<Gallery, GalleryLoadError> {
        if !dir.is_dir() {
            return Err(GalleryLoadError::MissingDirectory(dir.to_path_buf()));
        }

        let mut entries = Vec::new();
        for path in image_files(dir)? {
            let Some(label) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };

            let frame = match image::open(&path) {
                Ok(img) => Frame::from_rgb_image(img.to_rgb8()),
                Err(e) => {
                    log::warn!("Cannot decode {}: {e}. Skipping...", path.display());
                    continue;
                }
            };

            let inference_err = |e: Box<dyn std::error::Error>| GalleryLoadError::Inference {
                path: path.clone(),
                message: e.to_string(),
            };
            let faces = self.detector.detect(&frame).map_err(inference_err)?;
            let Some(face) = faces.first() else {
                log::warn!("No face detected in {}. Skipping...", path.display());
                continue;
            };
            let embedding = self.embedder.embed(&frame, face).map_err(inference_err)?;

            log::debug!("Gallery entry '{label}' from {}", path.display());
            entries.push(GalleryEntry::new(label, embedding));
        }

        log::info!("Loaded {} target faces from {}", entries.len(), dir.display());
        Ok(Gallery::new(entries))
    }
}

/// Image files directly inside `dir`, sorted by file name.
fn image_files(dir: &Path) -> Result<Vec<PathBuf>, GalleryLoadError> {
    let read_err = |source| GalleryLoadError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        if path.is_file() && has_image_extension(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_detection::FaceDetection;
    use crate::recognition::domain::embedding::Embedding;

    /// Finds a face only in images whose top-left pixel is non-black.
    struct StubDetector;

    impl FaceDetector for StubDetector {
        fn detect(
            &mut self,
            frame: &Frame,
        ) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
            if frame.data()[0] == 0 {
                return Ok(Vec::new());
            }
            Ok(vec![FaceDetection {
                bbox: [0.0, 0.0, frame.width() as f64, frame.height() as f64],
                confidence: 0.9,
                landmarks: None,
            }])
        }
    }

    /// Embeds a face as its top-left red value.
    struct StubEmbedder;

    impl FaceEmbedder for StubEmbedder {
        fn embed(
            &mut self,
            frame: &Frame,
            _face: &FaceDetection,
        ) -> Result<Embedding, Box<dyn std::error::Error>> {
            Ok(Embedding::new(vec![frame.data()[0] as f32]))
        }
    }

    fn write_image(dir: &Path, name: &str, red: u8) {
        let img = image::RgbImage::from_pixel(8, 8, image::Rgb([red, 0, 0]));
        img.save(dir.join(name)).unwrap();
    }

    fn load(dir: &Path) -> Result<Gallery, GalleryLoadError> {
        let mut detector = StubDetector;
        let mut embedder = StubEmbedder;
        ImageGalleryLoader::new(&mut detector, &mut embedder).load(dir)
    }

    #[test]
    fn test_labels_are_file_stems_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "bob.png", 20);
        write_image(dir.path(), "1234.png", 10);
        write_image(dir.path(), "carol.png", 30);

        let gallery = load(dir.path()).unwrap();
        assert_eq!(
            gallery.labels().collect::<Vec<_>>(),
            vec!["1234", "bob", "carol"]
        );
        assert_eq!(gallery.entries()[1].embedding.values(), &[20.0]);
    }

    #[test]
    fn test_images_without_faces_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_image(dir.path(), "blank.png", 0);
        write_image(dir.path(), "dave.png", 40);

        let gallery = load(dir.path()).unwrap();
        assert_eq!(gallery.labels().collect::<Vec<_>>(), vec!["dave"]);
    }

    #[test]
    fn test_non_images_and_corrupt_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        fs::write(dir.path().join("broken.jpg"), b"not a jpeg").unwrap();
        write_image(dir.path(), "erin.png", 50);

        let gallery = load(dir.path()).unwrap();
        assert_eq!(gallery.len(), 1);
    }

    #[test]
    fn test_empty_directory_gives_empty_gallery() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load(&dir.path().join("faces"));
        assert!(matches!(result, Err(GalleryLoadError::MissingDirectory(_))));
    }
}
