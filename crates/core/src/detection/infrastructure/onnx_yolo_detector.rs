/// YOLO pose-style face detector using ONNX Runtime via `ort`.
///
/// Letterboxes the frame, runs inference, filters by confidence, applies
/// NMS and returns boxes with their five keypoints.
use std::path::Path;

use crate::detection::domain::face_detection::FaceDetection;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::frame::Frame;
use crate::shared::onnx_session;

/// Fallback YOLO model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

/// Number of keypoints per detection (5 landmarks × 3 values each: x, y, conf).
const NUM_KEYPOINT_VALUES: usize = 15;

/// Minimum keypoint confidence to treat a landmark as visible.
const KEYPOINT_CONF_THRESH: f64 = 0.5;

pub struct OnnxYoloDetector {
    session: ort::session::Session,
    confidence: f64,
    max_faces: usize,
    input_size: u32,
}

impl OnnxYoloDetector {
    /// Loads the model. `max_faces == 0` keeps every face above `confidence`.
    ///
    /// The input resolution is read from the model's NCHW input shape,
    /// falling back to 640 when the shape is dynamic.
    pub fn new(
        model_path: &Path,
        confidence: f64,
        max_faces: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = onnx_session::load_session(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { shape, .. } if shape.len() >= 4 && shape[2] > 0 => {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        Ok(Self {
            session,
            confidence,
            max_faces,
            input_size,
        })
    }
}

impl FaceDetector for OnnxYoloDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
        let (input_tensor, letterbox) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
        }

        // [1, features, detections] is the usual export; some tools emit
        // [1, detections, features] instead.
        let transposed = shape[1] < shape[2];
        let (num_dets, num_feats) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let mut candidates = Vec::new();
        for i in 0..num_dets {
            let row: Vec<f32> = if transposed {
                (0..num_feats).map(|f| data[f * num_dets + i]).collect()
            } else {
                data[i * num_feats..(i + 1) * num_feats].to_vec()
            };
            if let Some(det) = parse_row(&row, &letterbox, self.confidence) {
                candidates.push(det);
            }
        }

        let mut faces = nms(candidates, NMS_IOU_THRESH);
        if self.max_faces > 0 {
            faces.truncate(self.max_faces);
        }
        Ok(faces)
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq)]
struct Letterbox {
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl Letterbox {
    fn to_frame(self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.pad_x as f64) / self.scale,
            (y - self.pad_y as f64) / self.scale,
        )
    }
}

/// Letterbox-resize a frame to `target_size` × `target_size` NCHW float32,
/// padding with YOLO's 114 gray.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let gray = 114.0f32 / 255.0;
    let mut tensor =
        ndarray::Array4::<f32>::from_elem((1, 3, target_size as usize, target_size as usize), gray);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (tensor, Letterbox { scale, pad_x, pad_y })
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

/// Parses `[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]` in letterbox
/// space into frame coordinates. Returns `None` below `min_confidence`.
fn parse_row(row: &[f32], letterbox: &Letterbox, min_confidence: f64) -> Option<FaceDetection> {
    if row.len() < 5 {
        return None;
    }
    let confidence = row[4] as f64;
    if confidence < min_confidence {
        return None;
    }

    let (cx, cy, w, h) = (row[0] as f64, row[1] as f64, row[2] as f64, row[3] as f64);
    let (x1, y1) = letterbox.to_frame(cx - w / 2.0, cy - h / 2.0);
    let (x2, y2) = letterbox.to_frame(cx + w / 2.0, cy + h / 2.0);

    let landmarks = (row.len() >= 5 + NUM_KEYPOINT_VALUES).then(|| {
        let mut pts = [(0.0f64, 0.0f64); 5];
        for (k, pt) in pts.iter_mut().enumerate() {
            let base = 5 + k * 3;
            if row[base + 2] as f64 >= KEYPOINT_CONF_THRESH {
                *pt = letterbox.to_frame(row[base] as f64, row[base + 1] as f64);
            }
        }
        FaceLandmarks::new(pts)
    });

    Some(FaceDetection {
        bbox: [x1, y1, x2, y2],
        confidence,
        landmarks,
    })
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(mut dets: Vec<FaceDetection>, iou_thresh: f64) -> Vec<FaceDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<FaceDetection> = Vec::new();
    for det in dets {
        if keep.iter().all(|k| bbox_iou(&k.bbox, &det.bbox) <= iou_thresh) {
            keep.push(det);
        }
    }
    keep
}

fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let x1 = a[0].max(b[0]);
    let y1 = a[1].max(b[1]);
    let x2 = a[2].min(b[2]);
    let y2 = a[3].min(b[3]);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn det(bbox: [f64; 4], confidence: f64) -> FaceDetection {
        FaceDetection {
            bbox,
            confidence,
            landmarks: None,
        }
    }

    const IDENTITY: Letterbox = Letterbox {
        scale: 1.0,
        pad_x: 0,
        pad_y: 0,
    };

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        // 200x100 → scale 3.2, 640x320 content, 160 rows of padding on top
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100, 3, 0);
        let (tensor, lb) = letterbox(&frame, 640);

        assert_eq!(tensor.shape(), &[1, 3, 640, 640]);
        assert_relative_eq!(lb.scale, 3.2, epsilon = 0.01);
        assert_eq!(lb.pad_x, 0);
        assert_eq!(lb.pad_y, 160);
    }

    #[test]
    fn test_letterbox_values_normalized() {
        let frame = Frame::new(vec![255u8; 100 * 50 * 3], 100, 50, 3, 0);
        let (tensor, lb) = letterbox(&frame, 640);

        let y = lb.pad_y as usize + 1;
        let x = lb.pad_x as usize + 1;
        assert_relative_eq!(tensor[[0, 0, y, x]], 1.0, epsilon = 0.01);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 114.0 / 255.0, epsilon = 0.01);
    }

    #[test]
    fn test_letterbox_maps_back_to_frame() {
        let lb = Letterbox {
            scale: 2.0,
            pad_x: 0,
            pad_y: 100,
        };
        assert_eq!(lb.to_frame(200.0, 300.0), (100.0, 100.0));
    }

    #[test]
    fn test_parse_row_below_confidence_is_dropped() {
        let row = [50.0, 50.0, 20.0, 20.0, 0.3];
        assert!(parse_row(&row, &IDENTITY, 0.5).is_none());
    }

    #[test]
    fn test_parse_row_converts_center_to_corners() {
        let row = [50.0, 60.0, 20.0, 40.0, 0.9];
        let face = parse_row(&row, &IDENTITY, 0.5).unwrap();
        assert_eq!(face.bbox, [40.0, 40.0, 60.0, 80.0]);
        assert!(face.landmarks.is_none());
    }

    #[test]
    fn test_parse_row_hides_low_confidence_keypoints() {
        let mut row = vec![50.0f32, 50.0, 20.0, 20.0, 0.9];
        for k in 0..5 {
            let conf = if k == 2 { 0.1 } else { 0.9 };
            row.extend_from_slice(&[40.0 + k as f32, 45.0, conf]);
        }
        let face = parse_row(&row, &IDENTITY, 0.5).unwrap();
        let lm = face.landmarks.unwrap();
        assert_eq!(lm.visible_count(), 4);
        assert_eq!(lm.points()[2].0, 0.0);
    }

    #[test]
    fn test_nms_suppresses_overlapping() {
        let kept = nms(
            vec![
                det([5.0, 5.0, 105.0, 105.0], 0.8),
                det([0.0, 0.0, 100.0, 100.0], 0.9),
            ],
            0.3,
        );
        assert_eq!(kept.len(), 1);
        assert_relative_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_nms_keeps_non_overlapping_in_confidence_order() {
        let kept = nms(
            vec![
                det([0.0, 0.0, 50.0, 50.0], 0.6),
                det([200.0, 200.0, 250.0, 250.0], 0.8),
            ],
            0.3,
        );
        assert_eq!(kept.len(), 2);
        assert_relative_eq!(kept[0].confidence, 0.8);
    }

    #[test]
    fn test_nms_empty_input() {
        assert!(nms(Vec::new(), 0.3).is_empty());
    }

    #[test]
    fn test_bbox_iou() {
        let b = [0.0, 0.0, 10.0, 10.0];
        assert_relative_eq!(bbox_iou(&b, &b), 1.0);
        assert_eq!(bbox_iou(&b, &[20.0, 20.0, 30.0, 30.0]), 0.0);
    }
}
