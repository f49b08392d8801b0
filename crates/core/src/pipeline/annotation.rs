use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::{Frame, CHANNELS};

pub const OVERLAY_COLOR: [u8; 3] = [0, 255, 0];
pub const OVERLAY_THICKNESS: u32 = 2;

/// Draws rectangle outlines in place.
///
/// Boxes are clipped to the frame; a box thinner than the stroke is filled.
pub fn draw_boxes(frame: &mut Frame, boxes: &[BoundingBox], color: [u8; 3], thickness: u32) {
    let fw = frame.width();
    let fh = frame.height();
    let channels = CHANNELS as usize;
    let stride = fw as usize * channels;
    let t = thickness.max(1) as i32;
    let data = frame.data_mut();

    for b in boxes {
        let b = b.clamped(fw, fh);
        if b.is_empty() {
            continue;
        }

        for y in b.top..b.bottom {
            let on_horizontal_edge = y < b.top + t || y >= b.bottom - t;
            let row = y as usize * stride;
            for x in b.left..b.right {
                let on_edge = on_horizontal_edge || x < b.left + t || x >= b.right - t;
                if on_edge {
                    let offset = row + x as usize * channels;
                    data[offset..offset + channels].copy_from_slice(&color);
                }
            }
        }
    }
}

/// Returns a copy of `frame` with the default overlay style applied.
pub fn annotate(frame: &Frame, boxes: &[BoundingBox]) -> Frame {
    let mut out = frame.clone();
    draw_boxes(&mut out, boxes, OVERLAY_COLOR, OVERLAY_THICKNESS);
    out
}
