//! Keypoint alignment for ArcFace input.
//!
//! Maps the five detected landmarks onto the canonical ArcFace template with
//! a least-squares similarity transform (uniform scale, rotation,
//! translation) and resamples the face into a 112x112 RGB crop.

use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::frame::Frame;

pub const ALIGNED_SIZE: u32 = 112;

/// Landmark positions in a 112x112 ArcFace crop, in `FaceLandmarks` order.
pub const ARCFACE_TEMPLATE: [(f64, f64); 5] = [
    (38.2946, 51.6963),
    (73.5318, 51.5014),
    (56.0252, 71.7366),
    (41.5493, 92.3655),
    (70.7299, 92.2041),
];

/// `dst = [a -b; b a] * src + t`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimilarityTransform {
    a: f64,
    b: f64,
    tx: f64,
    ty: f64,
}

impl SimilarityTransform {
    /// Least-squares fit from `src` to `dst`. `None` when the source points
    /// all coincide.
    pub fn estimate(src: &[(f64, f64); 5], dst: &[(f64, f64); 5]) -> Option<Self> {
        let (sx, sy) = mean(src);
        let (dx, dy) = mean(dst);

        let (mut dot, mut cross, mut spread) = (0.0, 0.0, 0.0);
        for (&(px, py), &(qx, qy)) in src.iter().zip(dst) {
            let (px, py, qx, qy) = (px - sx, py - sy, qx - dx, qy - dy);
            dot += px * qx + py * qy;
            cross += px * qy - py * qx;
            spread += px * px + py * py;
        }
        if spread < 1e-9 {
            return None;
        }

        let (a, b) = (dot / spread, cross / spread);
        Some(Self {
            a,
            b,
            tx: dx - (a * sx - b * sy),
            ty: dy - (b * sx + a * sy),
        })
    }

    pub fn apply(&self, (x, y): (f64, f64)) -> (f64, f64) {
        (
            self.a * x - self.b * y + self.tx,
            self.b * x + self.a * y + self.ty,
        )
    }

    /// Source point that lands on `(x, y)`.
    fn invert(&self, (x, y): (f64, f64)) -> (f64, f64) {
        let det = self.a * self.a + self.b * self.b;
        let (u, v) = (x - self.tx, y - self.ty);
        (
            (self.a * u + self.b * v) / det,
            (self.a * v - self.b * u) / det,
        )
    }
}

fn mean(points: &[(f64, f64); 5]) -> (f64, f64) {
    let (x, y) = points
        .iter()
        .fold((0.0, 0.0), |(ax, ay), &(x, y)| (ax + x, ay + y));
    (x / 5.0, y / 5.0)
}

/// Warps the face onto the ArcFace template. Returns `None` unless all five
/// landmarks are visible.
pub fn align_face(frame: &Frame, landmarks: &FaceLandmarks) -> Option<Frame> {
    if landmarks.visible_count() < 5 {
        return None;
    }
    let transform = SimilarityTransform::estimate(landmarks.points(), &ARCFACE_TEMPLATE)?;

    let size = ALIGNED_SIZE as usize;
    let mut data = Vec::with_capacity(size * size * 3);
    for oy in 0..size {
        for ox in 0..size {
            let (sx, sy) = transform.invert((ox as f64, oy as f64));
            data.extend(bilinear(frame, sx, sy));
        }
    }
    Some(Frame::new(data, ALIGNED_SIZE, ALIGNED_SIZE, 3, frame.index()))
}

/// RGB sample at a fractional position; outside the frame reads as black.
fn bilinear(frame: &Frame, x: f64, y: f64) -> [u8; 3] {
    let (w, h) = (frame.width() as i64, frame.height() as i64);
    let data = frame.data();
    let (x0, y0) = (x.floor() as i64, y.floor() as i64);
    let (fx, fy) = (x - x0 as f64, y - y0 as f64);

    let texel = |px: i64, py: i64, c: usize| -> f64 {
        if px < 0 || py < 0 || px >= w || py >= h {
            return 0.0;
        }
        data[((py * w + px) * 3) as usize + c] as f64
    };

    let mut out = [0u8; 3];
    for (c, value) in out.iter_mut().enumerate() {
        let v = texel(x0, y0, c) * (1.0 - fx) * (1.0 - fy)
            + texel(x0 + 1, y0, c) * fx * (1.0 - fy)
            + texel(x0, y0 + 1, c) * (1.0 - fx) * fy
            + texel(x0 + 1, y0 + 1, c) * fx * fy;
        *value = v.round().clamp(0.0, 255.0) as u8;
    }
    out
}
