pub mod arcface_embedder;
pub mod execution_provider;
pub mod onnx_face_encoder;
pub mod yolo_face_locator;
