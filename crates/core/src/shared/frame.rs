use ndarray::ArrayView3;

/// A single decoded video frame or gallery image: contiguous RGB bytes in
/// row-major order.
///
/// Decoders convert to RGB at the I/O boundary; detection and embedding
/// only ever see this type.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
    }

    /// Wraps a decoded still image as frame 0.
    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height, 3, 0)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Square crop of side `2 * half` centered on `(cx, cy)`, clamped to the
    /// frame. Returns `None` when the clamped area is empty.
    pub fn square_crop(&self, cx: f64, cy: f64, half: f64) -> Option<Frame> {
        let fw = self.width as f64;
        let fh = self.height as f64;

        let x1 = (cx - half).max(0.0).floor() as usize;
        let y1 = (cy - half).max(0.0).floor() as usize;
        let x2 = (cx + half).min(fw).ceil().max(0.0) as usize;
        let y2 = (cy + half).min(fh).ceil().max(0.0) as usize;
        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        let channels = self.channels as usize;
        let src = self.as_ndarray();
        let mut data = Vec::with_capacity((x2 - x1) * (y2 - y1) * channels);
        for row in y1..y2 {
            for col in x1..x2 {
                for c in 0..channels {
                    data.push(src[[row, col, c]]);
                }
            }
        }

        Some(Frame::new(
            data,
            (x2 - x1) as u32,
            (y2 - y1) as u32,
            self.channels,
            self.index,
        ))
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_and_accessors() {
        let data = vec![0u8; 12]; // 2x2x3
        let frame = Frame::new(data.clone(), 2, 2, 3, 5);
        assert_eq!(frame.width(), 2);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.index(), 5);
        assert_eq!(frame.data(), &data[..]);
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * channels")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 3, 0);
    }

    #[test]
    fn test_from_rgb_image() {
        let mut img = image::RgbImage::new(4, 2);
        img.put_pixel(3, 1, image::Rgb([10, 20, 30]));
        let frame = Frame::from_rgb_image(img);
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.index(), 0);
        assert_eq!(frame.as_ndarray()[[1, 3, 2]], 30);
    }

    #[test]
    fn test_square_crop_inside_frame() {
        let mut data = vec![0u8; 10 * 10 * 3];
        // pixel (row=5, col=5) red
        data[(5 * 10 + 5) * 3] = 255;
        let frame = Frame::new(data, 10, 10, 3, 7);

        let crop = frame.square_crop(5.0, 5.0, 2.0).unwrap();
        assert_eq!(crop.width(), 4);
        assert_eq!(crop.height(), 4);
        assert_eq!(crop.index(), 7);
        // (5,5) lands at (2,2) in the crop
        assert_eq!(crop.as_ndarray()[[2, 2, 0]], 255);
    }

    #[test]
    fn test_square_crop_clamps_to_edges() {
        let frame = Frame::new(vec![1u8; 10 * 10 * 3], 10, 10, 3, 0);
        let crop = frame.square_crop(0.0, 0.0, 4.0).unwrap();
        assert_eq!(crop.width(), 4);
        assert_eq!(crop.height(), 4);
    }

    #[test]
    fn test_square_crop_outside_frame_is_none() {
        let frame = Frame::new(vec![1u8; 10 * 10 * 3], 10, 10, 3, 0);
        assert!(frame.square_crop(50.0, 50.0, 4.0).is_none());
    }

    #[test]
    fn test_as_ndarray_shape() {
        let frame = Frame::new(vec![0u8; 24], 4, 2, 3, 0);
        assert_eq!(frame.as_ndarray().shape(), &[2, 4, 3]);
    }
}
