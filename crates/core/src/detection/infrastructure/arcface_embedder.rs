/// ArcFace embedding extraction using ONNX Runtime.
///
/// Crops a face box out of the frame, resizes it to the 112x112 network
/// input, and returns the L2-normalised output vector.
use std::path::Path;

use crate::detection::domain::face_embedding::FaceEmbedding;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

use super::execution_provider::preferred_execution_providers;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct ArcFaceEmbedder {
    session: ort::session::Session,
}

impl ArcFaceEmbedder {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let intra_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let session = ort::session::Session::builder()?
            .with_execution_providers(preferred_execution_providers())?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_inter_threads(1)?
            .with_intra_threads(intra_threads)?
            .commit_from_file(model_path)?;
        Ok(Self { session })
    }

    pub fn embed(
        &mut self,
        frame: &Frame,
        face: &BoundingBox,
    ) -> Result<FaceEmbedding, Box<dyn std::error::Error>> {
        let tensor = preprocess(frame, face).ok_or("face box lies outside the frame")?;
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let mut values = embedding_array
            .as_slice()
            .ok_or("cannot read embedding output")?
            .to_vec();
        l2_normalize(&mut values);
        Ok(FaceEmbedding::new(values))
    }
}

/// Samples the face box into a normalised 1x3x112x112 NCHW tensor.
///
/// Returns `None` when the box has no overlap with the frame.
fn preprocess(frame: &Frame, face: &BoundingBox) -> Option<ndarray::Array4<f32>> {
    let crop = face.clamped(frame.width(), frame.height());
    if crop.is_empty() {
        return None;
    }
    let crop_w = crop.width() as f64;
    let crop_h = crop.height() as f64;
    let src = frame.as_ndarray();

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));
    for y in 0..INPUT_SIZE {
        let offset_y = (((y as f64 + 0.5) * crop_h / INPUT_SIZE as f64) as i32).min(crop.height() - 1);
        let src_y = (crop.top + offset_y) as usize;
        for x in 0..INPUT_SIZE {
            let offset_x =
                (((x as f64 + 0.5) * crop_w / INPUT_SIZE as f64) as i32).min(crop.width() - 1);
            let src_x = (crop.left + offset_x) as usize;
            for c in 0..3 {
                tensor[[0, c, y, x]] = (src[[src_y, src_x, c]] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }
    Some(tensor)
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
