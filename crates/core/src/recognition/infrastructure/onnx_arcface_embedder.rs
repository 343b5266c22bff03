/// ArcFace embedder using ONNX Runtime.
///
/// Aligns the face onto the ArcFace template when all five keypoints are
/// visible, otherwise crops a square around it. The 112x112 input is run
/// through the model and the output L2-normalized.
use std::path::Path;

use crate::detection::domain::face_detection::FaceDetection;
use crate::recognition::domain::embedding::Embedding;
use crate::recognition::domain::face_embedder::FaceEmbedder;
use crate::recognition::infrastructure::face_alignment::align_face;
use crate::shared::constants::EMBEDDING_DIM;
use crate::shared::frame::Frame;
use crate::shared::onnx_session;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct OnnxArcFaceEmbedder {
    session: ort::session::Session,
}

impl OnnxArcFaceEmbedder {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: onnx_session::load_session(model_path)?,
        })
    }
}

impl FaceEmbedder for OnnxArcFaceEmbedder {
    fn embed(
        &mut self,
        frame: &Frame,
        face: &FaceDetection,
    ) -> Result<Embedding, Box<dyn std::error::Error>> {
        let crop = face_input(frame, face)?;
        let tensor = preprocess(crop.data(), crop.width(), crop.height());
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let values = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?
            .to_vec();

        if values.len() != EMBEDDING_DIM {
            return Err(format!(
                "Expected {EMBEDDING_DIM}-dim embedding, got {}",
                values.len()
            )
            .into());
        }

        Ok(Embedding::new(values).normalized())
    }
}

/// The aligned face, or a landmark-centered square when alignment is not
/// possible.
fn face_input(frame: &Frame, face: &FaceDetection) -> Result<Frame, Box<dyn std::error::Error>> {
    if let Some(aligned) = face.landmarks.as_ref().and_then(|lm| align_face(frame, lm)) {
        return Ok(aligned);
    }
    let (cx, cy, half) = face.crop_square();
    Ok(frame
        .square_crop(cx, cy, half)
        .ok_or("Face crop lies outside the frame")?)
}

/// Resize an RGB crop to 112x112, normalize, NCHW layout.
fn preprocess(rgb_data: &[u8], width: u32, height: u32) -> ndarray::Array4<f32> {
    let src_w = width as usize;
    let src_h = height as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));

    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * 3;
            if offset + 2 < rgb_data.len() {
                for c in 0..3 {
                    tensor[[0, c, y, x]] = (rgb_data[offset + c] as f32 - NORM_MEAN) / NORM_STD;
                }
            }
        }
    }

    tensor
}
