pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// Label carried by a detection that no gallery entry accepted.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Gallery acceptance threshold; a reference matches when `score > threshold`.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.4;

pub const DEFAULT_DETECTION_CONFIDENCE: f64 = 0.5;

/// Max gap between a new unknown score and a candidate's running average.
pub const DEFAULT_MERGE_TOLERANCE: f64 = 0.15;

/// Centroid similarity needed to fold an unknown into an unresolved record.
pub const DEFAULT_CENTROID_THRESHOLD: f64 = 0.4;

/// ArcFace w600k_r50 output width.
pub const EMBEDDING_DIM: usize = 512;

/// Decimal places kept for reported average confidences.
pub const CONFIDENCE_DECIMALS: i32 = 4;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
