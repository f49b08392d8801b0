use ndarray::{ArrayView3, ArrayViewMut3};

/// Bytes per pixel. Frames are always RGB24 once they leave an I/O adapter.
pub const CHANNELS: u8 = 3;

/// A single captured image: contiguous RGB bytes in row-major order.
///
/// `sequence` is the capture counter assigned by the device that produced
/// the frame (gallery images use 0).
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    sequence: u64,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (CHANNELS as usize),
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            sequence,
        }
    }

    /// Solid-colour frame, mostly useful for stubs and tests.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3], sequence: u64) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take((width as usize) * (height as usize) * CHANNELS as usize)
            .collect();
        Self::new(data, width, height, sequence)
    }

    pub fn from_rgb_image(image: image::RgbImage, sequence: u64) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, sequence)
    }

    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.data.clone())
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Shrinks the frame by an integer linear factor (bilinear filter).
    ///
    /// Output dimensions round to the nearest pixel and never drop below 1.
    /// A factor of 0 or 1 returns a copy.
    pub fn downsample(&self, factor: u32) -> Frame {
        if factor <= 1 {
            return self.clone();
        }
        let w = scaled_dimension(self.width, factor);
        let h = scaled_dimension(self.height, factor);
        let Some(img) = self.to_rgb_image() else {
            return self.clone();
        };
        let small = image::imageops::resize(&img, w, h, image::imageops::FilterType::Triangle);
        Frame::from_rgb_image(small, self.sequence)
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    pub fn as_ndarray_mut(&mut self) -> ArrayViewMut3<'_, u8> {
        ArrayViewMut3::from_shape(self.shape(), &mut self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            CHANNELS as usize,
        )
    }
}

fn scaled_dimension(size: u32, factor: u32) -> u32 {
    ((size as f64 / factor as f64).round() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_sets_every_pixel() {
        let frame = Frame::filled(3, 2, [10, 20, 30], 7);
        assert_eq!(frame.data().len(), 18);
        assert_eq!(frame.sequence(), 7);
        for px in frame.data().chunks(3) {
            assert_eq!(px, &[10, 20, 30]);
        }
    }

    #[test]
    #[should_panic(expected = "data length must equal width * height * 3")]
    fn test_mismatched_data_length_panics_in_debug() {
        Frame::new(vec![0u8; 10], 2, 2, 0);
    }

    #[test]
    fn test_downsample_quarters_dimensions() {
        let frame = Frame::filled(640, 480, [200, 100, 50], 3);
        let small = frame.downsample(4);
        assert_eq!(small.width(), 160);
        assert_eq!(small.height(), 120);
        assert_eq!(small.sequence(), 3);
        assert_eq!(&small.data()[..3], &[200, 100, 50]);
    }

    #[test]
    fn test_downsample_rounds_and_keeps_one_pixel() {
        let frame = Frame::filled(6, 2, [0, 0, 0], 0);
        let small = frame.downsample(4);
        // 6/4 = 1.5 rounds to 2, 2/4 = 0.5 rounds to 1
        assert_eq!((small.width(), small.height()), (2, 1));

        let tiny = Frame::filled(1, 1, [0, 0, 0], 0).downsample(4);
        assert_eq!((tiny.width(), tiny.height()), (1, 1));
    }

    #[test]
    fn test_downsample_factor_one_is_identity() {
        let frame = Frame::filled(5, 5, [1, 2, 3], 0);
        let same = frame.downsample(1);
        assert_eq!(same.data(), frame.data());
    }

    #[test]
    fn test_rgb_image_conversion_keeps_pixels() {
        let mut img = image::RgbImage::new(2, 1);
        img.put_pixel(1, 0, image::Rgb([9, 8, 7]));
        let frame = Frame::from_rgb_image(img, 0);
        assert_eq!(frame.as_ndarray()[[0, 1, 0]], 9);
        let back = frame.to_rgb_image().unwrap();
        assert_eq!(back.get_pixel(1, 0), &image::Rgb([9, 8, 7]));
    }

    #[test]
    fn test_as_ndarray_mut_modification() {
        let mut frame = Frame::filled(2, 2, [0, 0, 0], 0);
        frame.as_ndarray_mut()[[1, 0, 2]] = 128;
        assert_eq!(frame.data()[8], 128);
    }
}
