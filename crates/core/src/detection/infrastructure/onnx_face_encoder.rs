use std::path::Path;

use crate::detection::domain::face_embedding::DetectedFace;
use crate::detection::domain::face_encoder::FaceEncoder;
use crate::shared::frame::Frame;

use super::arcface_embedder::ArcFaceEmbedder;
use super::yolo_face_locator::YoloFaceLocator;

/// [`FaceEncoder`] backed by two ONNX models: a YOLO face locator and an
/// ArcFace embedder run on each located box.
pub struct OnnxFaceEncoder {
    locator: YoloFaceLocator,
    embedder: ArcFaceEmbedder,
}

impl OnnxFaceEncoder {
    pub fn new(
        detector_model: &Path,
        embedding_model: &Path,
        confidence: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        log::info!(
            "Loading face models: {} + {}",
            detector_model.display(),
            embedding_model.display()
        );
        Ok(Self {
            locator: YoloFaceLocator::new(detector_model, confidence)?,
            embedder: ArcFaceEmbedder::new(embedding_model)?,
        })
    }
}

impl FaceEncoder for OnnxFaceEncoder {
    fn encode(&mut self, frame: &Frame) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        let boxes = self.locator.locate(frame)?;
        boxes
            .into_iter()
            .map(|bounding_box| {
                let embedding = self.embedder.embed(frame, &bounding_box)?;
                Ok(DetectedFace::new(bounding_box, embedding))
            })
            .collect()
    }
}
