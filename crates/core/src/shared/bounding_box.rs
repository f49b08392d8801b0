/// Axis-aligned face box in pixel coordinates of the frame it was found in.
///
/// Edges follow the `top / right / bottom / left` convention; `right` and
/// `bottom` are exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BoundingBox {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl BoundingBox {
    pub fn new(top: i32, right: i32, bottom: i32, left: i32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Builds a box from `(x1, y1, x2, y2)` float corners, rounding outward.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            top: y1.floor() as i32,
            right: x2.ceil() as i32,
            bottom: y2.ceil() as i32,
            left: x1.floor() as i32,
        }
    }

    pub fn width(&self) -> i32 {
        (self.right - self.left).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.bottom - self.top).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Maps a box found in a downsampled frame back to full-frame coordinates.
    pub fn scaled(&self, factor: u32) -> Self {
        let f = factor.max(1) as i32;
        Self {
            top: self.top * f,
            right: self.right * f,
            bottom: self.bottom * f,
            left: self.left * f,
        }
    }

    /// Clips the box to a `width` x `height` frame.
    pub fn clamped(&self, width: u32, height: u32) -> Self {
        let w = width as i32;
        let h = height as i32;
        Self {
            top: self.top.clamp(0, h),
            right: self.right.clamp(0, w),
            bottom: self.bottom.clamp(0, h),
            left: self.left.clamp(0, w),
        }
    }
}
