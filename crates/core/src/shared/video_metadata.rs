use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Container-reported frame count; may be 0 when the stream doesn't say.
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Base name of the source file, or an empty string for unnamed sources.
    pub fn file_name(&self) -> String {
        self.source_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(source_path: Option<PathBuf>) -> VideoMetadata {
        VideoMetadata {
            width: 1920,
            height: 1080,
            fps: 30.0,
            total_frames: 900,
            codec: "h264".to_string(),
            source_path,
        }
    }

    #[test]
    fn test_file_name_strips_directories() {
        let meta = metadata(Some(PathBuf::from("/tmp/videos/lobby.mp4")));
        assert_eq!(meta.file_name(), "lobby.mp4");
    }

    #[test]
    fn test_file_name_without_source_is_empty() {
        let meta = metadata(None);
        assert_eq!(meta.file_name(), "");
    }

    #[test]
    fn test_clone_is_independent() {
        let meta = metadata(None);
        let cloned = meta.clone();
        assert_eq!(meta, cloned);
    }
}
