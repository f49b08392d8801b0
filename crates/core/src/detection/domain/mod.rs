pub mod face_embedding;
pub mod face_encoder;
