pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// Maximum embedding distance that still counts as the same person.
///
/// ArcFace embeddings are unit length, so a Euclidean distance `d` is a
/// cosine similarity of `1 - d²/2`. At 0.5 two faces need cosine >= 0.875,
/// which rejects many genuine matches under uneven lighting. Tune it per
/// deployment; values around 1.0 to 1.2 (cosine 0.5 to 0.28) are typical for
/// this embedder.
pub const DEFAULT_TOLERANCE: f64 = 0.5;

/// Linear shrink factor applied to camera frames before detection.
pub const DEFAULT_DOWNSAMPLE_FACTOR: u32 = 4;

/// Delay between the end of one cycle and the start of the next.
pub const DEFAULT_CYCLE_INTERVAL_MS: u64 = 10;

pub const DEFAULT_GALLERY_EXTENSION: &str = "png";

pub const ACCESS_GRANTED_VALUE: &str = "Yes";
pub const ACCESS_DENIED_VALUE: &str = "No";

pub const DEFAULT_STORE_NODE: &str = "door_lock";
pub const DEFAULT_STORE_FIELD: &str = "access";

/// Cameras offered to the operator, by index.
pub const CAMERA_CHOICES: &[(usize, &str)] = &[(0, "Main Camera"), (1, "External Camera")];
