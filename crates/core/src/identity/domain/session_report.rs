use serde::Serialize;

use crate::identity::domain::session_reporter::PersonSummary;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// End-of-run report. Field order is the serialized key order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SessionReport {
    pub video_file: String,
    pub total_frames: usize,
    pub fps: f64,
    pub persons: Vec<PersonSummary>,
    pub processing_timestamp: String,
}

impl SessionReport {
    /// Builds a report stamped with the current local time.
    pub fn new(
        video_file: impl Into<String>,
        total_frames: usize,
        fps: f64,
        persons: Vec<PersonSummary>,
    ) -> Self {
        Self {
            video_file: video_file.into(),
            total_frames,
            fps,
            persons,
            processing_timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_order() {
        let report = SessionReport::new("clip.mp4", 3, 25.0, Vec::new());
        let json = serde_json::to_string(&report).unwrap();

        let positions: Vec<usize> = [
            "video_file",
            "total_frames",
            "fps",
            "persons",
            "processing_timestamp",
        ]
        .iter()
        .map(|k| json.find(&format!("\"{k}\"")).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_timestamp_format() {
        let report = SessionReport::new("clip.mp4", 0, 30.0, Vec::new());
        let parsed = chrono::NaiveDateTime::parse_from_str(
            &report.processing_timestamp,
            TIMESTAMP_FORMAT,
        );
        assert!(parsed.is_ok());
        // Microsecond precision, no offset.
        assert_eq!(report.processing_timestamp.len(), 26);
    }
}
