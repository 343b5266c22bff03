use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_CENTROID_THRESHOLD, DEFAULT_DETECTION_CONFIDENCE, DEFAULT_MERGE_TOLERANCE,
    DEFAULT_SIMILARITY_THRESHOLD,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
}

/// How an unmatched detection is folded into an existing unresolved identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Compare the detection's gallery score with each candidate's running
    /// average score.
    #[default]
    Confidence,
    /// Compare the detection's embedding with each candidate's running
    /// embedding centroid.
    Centroid,
}

impl std::str::FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confidence" => Ok(MergeStrategy::Confidence),
            "centroid" => Ok(MergeStrategy::Centroid),
            other => Err(format!(
                "merge strategy must be 'confidence' or 'centroid', got '{other}'"
            )),
        }
    }
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeStrategy::Confidence => write!(f, "confidence"),
            MergeStrategy::Centroid => write!(f, "centroid"),
        }
    }
}

/// Tunables for a recognition run. Every field has a default, so a config
/// file only needs the keys it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    pub similarity_threshold: f64,
    pub detection_confidence: f64,
    pub merge_tolerance: f64,
    /// Faces kept per frame, most confident first. 0 keeps all.
    pub max_faces: usize,
    pub merge_strategy: MergeStrategy,
    pub centroid_threshold: f64,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            detection_confidence: DEFAULT_DETECTION_CONFIDENCE,
            merge_tolerance: DEFAULT_MERGE_TOLERANCE,
            max_faces: 0,
            merge_strategy: MergeStrategy::Confidence,
            centroid_threshold: DEFAULT_CENTROID_THRESHOLD,
        }
    }
}

impl RecognitionConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("similarity threshold", self.similarity_threshold, -1.0, 1.0)?;
        check_range("detection confidence", self.detection_confidence, 0.0, 1.0)?;
        check_range("merge tolerance", self.merge_tolerance, 0.0, 1.0)?;
        check_range("centroid threshold", self.centroid_threshold, -1.0, 1.0)?;
        Ok(())
    }
}

fn check_range(name: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            min,
            max,
            value,
        })
    }
}
