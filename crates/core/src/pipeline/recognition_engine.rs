use thiserror::Error;

use crate::detection::domain::face_encoder::FaceEncoder;
use crate::gallery::domain::gallery::Gallery;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::{DEFAULT_DOWNSAMPLE_FACTOR, DEFAULT_TOLERANCE};
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("face encoding failed: {0}")]
    Encoding(String),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecognitionConfig {
    /// Maximum embedding distance counted as a match (inclusive).
    pub tolerance: f64,
    /// Linear shrink factor applied before detection.
    pub downsample_factor: u32,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            downsample_factor: DEFAULT_DOWNSAMPLE_FACTOR,
        }
    }
}

/// Outcome of one recognition pass over a frame.
///
/// `annotated_regions` is only populated when nothing matched; it then
/// holds every detected face in full-frame coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecognitionResult {
    pub matched: bool,
    pub annotated_regions: Vec<BoundingBox>,
    pub matched_label: Option<String>,
}

/// Answers "is a known person in this frame".
///
/// Faces are checked in detection order and the first one with any gallery
/// entry within tolerance ends the search. Faces after it are neither
/// compared nor reported.
pub struct RecognitionEngine {
    encoder: Box<dyn FaceEncoder>,
    config: RecognitionConfig,
}

impl RecognitionEngine {
    pub fn new(encoder: Box<dyn FaceEncoder>, config: RecognitionConfig) -> Self {
        Self { encoder, config }
    }

    pub fn recognize(
        &mut self,
        frame: &Frame,
        gallery: &Gallery,
    ) -> Result<RecognitionResult, RecognitionError> {
        let factor = self.config.downsample_factor.max(1);
        let small = frame.downsample(factor);
        let faces = self
            .encoder
            .encode(&small)
            .map_err(|e| RecognitionError::Encoding(e.to_string()))?;

        let mut regions = Vec::with_capacity(faces.len());
        for face in &faces {
            if let Some(entry) = gallery.first_match(&face.embedding, self.config.tolerance) {
                log::debug!("Frame {}: matched '{}'", frame.sequence(), entry.label);
                return Ok(RecognitionResult {
                    matched: true,
                    annotated_regions: Vec::new(),
                    matched_label: Some(entry.label.clone()),
                });
            }
            regions.push(
                face.bounding_box
                    .scaled(factor)
                    .clamped(frame.width(), frame.height()),
            );
        }

        log::debug!(
            "Frame {}: {} face(s), no match",
            frame.sequence(),
            regions.len()
        );
        Ok(RecognitionResult {
            matched: false,
            annotated_regions: regions,
            matched_label: None,
        })
    }
}
