use crate::detection::domain::face_embedding::DetectedFace;
use crate::shared::frame::Frame;

/// Domain interface for the face detection + encoding capability.
///
/// Returns every face found in the frame, in detection order, each with its
/// bounding box (in the coordinates of `frame`) and embedding.
/// Implementations hold inference sessions, hence `&mut self`.
pub trait FaceEncoder: Send {
    fn encode(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>>;
}
