use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use facelock_core::detection::infrastructure::yolo_face_locator::DEFAULT_CONFIDENCE;
use facelock_core::pipeline::recognition_engine::RecognitionConfig;
use facelock_core::publishing::domain::decision_publisher::DecisionValues;
use facelock_core::publishing::infrastructure::firebase_store::{FirebaseConfig, DEFAULT_TIMEOUT};
use facelock_core::shared::constants::{
    ACCESS_DENIED_VALUE, ACCESS_GRANTED_VALUE, DEFAULT_CYCLE_INTERVAL_MS,
    DEFAULT_DOWNSAMPLE_FACTOR, DEFAULT_GALLERY_EXTENSION, DEFAULT_STORE_FIELD, DEFAULT_STORE_NODE,
    DEFAULT_TOLERANCE,
};

pub const DEFAULT_SETTINGS_PATH: &str = "facelock.json";
const DEFAULT_GALLERY_DIR: &str = "images";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("cannot read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GallerySettings {
    pub directory: PathBuf,
    pub extension: String,
}

impl Default for GallerySettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_GALLERY_DIR),
            extension: DEFAULT_GALLERY_EXTENSION.to_string(),
        }
    }
}

/// Capture device options. Unset fields use the platform defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub index: usize,
    pub input_format: Option<String>,
    pub device_template: Option<String>,
    pub framerate: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionSettings {
    /// Maximum embedding distance that counts as a match. The 0.5 default is
    /// strict for unit-length ArcFace embeddings (cosine >= 0.875); raise it
    /// toward 1.0 to 1.2 if enrolled people are being denied.
    pub tolerance: f64,
    pub downsample_factor: u32,
    pub confidence: f64,
    pub cycle_interval_ms: u64,
    /// Directory checked for model files before downloading.
    pub models_dir: Option<PathBuf>,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            downsample_factor: DEFAULT_DOWNSAMPLE_FACTOR,
            confidence: DEFAULT_CONFIDENCE,
            cycle_interval_ms: DEFAULT_CYCLE_INTERVAL_MS,
            models_dir: None,
        }
    }
}

impl RecognitionSettings {
    pub fn engine_config(&self) -> RecognitionConfig {
        RecognitionConfig {
            tolerance: self.tolerance,
            downsample_factor: self.downsample_factor,
        }
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Realtime Database root URL. Required unless running dry.
    pub database_url: Option<String>,
    pub node_path: String,
    pub field: String,
    pub auth_token: Option<String>,
    pub granted_value: String,
    pub denied_value: String,
    pub timeout_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            database_url: None,
            node_path: DEFAULT_STORE_NODE.to_string(),
            field: DEFAULT_STORE_FIELD.to_string(),
            auth_token: None,
            granted_value: ACCESS_GRANTED_VALUE.to_string(),
            denied_value: ACCESS_DENIED_VALUE.to_string(),
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
        }
    }
}

impl StoreSettings {
    pub fn decision_values(&self) -> DecisionValues {
        DecisionValues {
            granted: self.granted_value.clone(),
            denied: self.denied_value.clone(),
        }
    }

    pub fn firebase_config(&self) -> Result<FirebaseConfig, SettingsError> {
        let url = self.database_url.as_deref().ok_or_else(|| {
            SettingsError::Invalid(
                "store.database_url is not set (use --dry-run to run without a store)".into(),
            )
        })?;
        let mut config = FirebaseConfig::new(url);
        config.node_path = self.node_path.clone();
        config.field = self.field.clone();
        config.auth_token = self.auth_token.clone();
        config.timeout = Duration::from_millis(self.timeout_ms);
        Ok(config)
    }
}

/// Everything the `facelock` binary can be configured with.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub gallery: GallerySettings,
    pub camera: CameraSettings,
    pub recognition: RecognitionSettings,
    pub store: StoreSettings,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::debug!("No settings file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let r = &self.recognition;
        if !r.tolerance.is_finite() || r.tolerance < 0.0 {
            return Err(SettingsError::Invalid(format!(
                "Tolerance must be a non-negative number, got {}",
                r.tolerance
            )));
        }
        if r.downsample_factor == 0 {
            return Err(SettingsError::Invalid(
                "Downsample factor must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&r.confidence) {
            return Err(SettingsError::Invalid(format!(
                "Confidence must be between 0.0 and 1.0, got {}",
                r.confidence
            )));
        }
        if self.store.granted_value == self.store.denied_value {
            return Err(SettingsError::Invalid(format!(
                "Granted and denied values must differ, both are '{}'",
                self.store.granted_value
            )));
        }
        Ok(())
    }
}
