mod console;
mod log_sink;
mod settings;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use facelock_core::capture::domain::capture_session::CaptureSession;
use facelock_core::capture::infrastructure::ffmpeg_camera::FfmpegCameraBackend;
use facelock_core::detection::infrastructure::onnx_face_encoder::OnnxFaceEncoder;
use facelock_core::gallery::domain::gallery::Gallery;
use facelock_core::gallery::infrastructure::directory_gallery_loader::DirectoryGalleryLoader;
use facelock_core::pipeline::cycle_logger::StatsCycleLogger;
use facelock_core::pipeline::loop_controller::{ControlCommand, LoopController};
use facelock_core::pipeline::recognition_engine::RecognitionEngine;
use facelock_core::publishing::domain::decision_publisher::DecisionPublisher;
use facelock_core::publishing::domain::decision_store::DecisionStore;
use facelock_core::publishing::infrastructure::firebase_store::FirebaseStore;
use facelock_core::publishing::infrastructure::memory_store::MemoryStore;
use facelock_core::shared::model_resolver::{
    self, ModelSpec, FACE_DETECTOR_MODEL, FACE_EMBEDDING_MODEL,
};

use log_sink::{LogRenderSink, SnapshotWriter};
use settings::{CameraSettings, Settings, DEFAULT_SETTINGS_PATH};

/// Face recognition door lock: grants access when a known face is in view.
#[derive(Parser, Debug)]
#[command(name = "facelock")]
struct Cli {
    /// Settings file (JSON). A missing default file means built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of reference face images.
    #[arg(long)]
    gallery: Option<PathBuf>,

    /// Camera index opened by `start`.
    #[arg(long)]
    camera: Option<usize>,

    /// Maximum embedding distance that counts as a match. Raise it toward
    /// 1.0 to 1.2 if enrolled people are denied.
    #[arg(long)]
    tolerance: Option<f64>,

    /// Keep decisions in memory instead of writing to the remote store.
    #[arg(long)]
    dry_run: bool,

    /// Write the latest annotated frame to this PNG file.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Write the snapshot every N captured frames.
    #[arg(long, default_value = "30")]
    snapshot_every: u64,

    /// Start recognition immediately instead of waiting for `start`.
    #[arg(long)]
    autostart: bool,
}

impl Cli {
    fn load_settings(&self) -> Result<Settings, settings::SettingsError> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::load_or_default(&PathBuf::from(DEFAULT_SETTINGS_PATH))?,
        };
        if let Some(dir) = &self.gallery {
            settings.gallery.directory = dir.clone();
        }
        if let Some(index) = self.camera {
            settings.camera.index = index;
        }
        if let Some(tolerance) = self.tolerance {
            settings.recognition.tolerance = tolerance;
        }
        settings.validate()?;
        Ok(settings)
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = cli.load_settings()?;

    let mut encoder = build_encoder(&settings)?;
    let gallery = load_gallery(&settings, &mut encoder)?;
    let store = build_store(&settings, cli.dry_run)?;

    let snapshot = cli
        .snapshot
        .clone()
        .map(|path| SnapshotWriter::new(path, cli.snapshot_every));

    let mut controller = LoopController::new(
        CaptureSession::new(Box::new(build_camera_backend(&settings.camera))),
        RecognitionEngine::new(Box::new(encoder), settings.recognition.engine_config()),
        Arc::new(gallery),
        DecisionPublisher::new(store, settings.store.decision_values()),
        Box::new(LogRenderSink::new(snapshot)),
    )
    .with_interval(settings.recognition.cycle_interval())
    .with_logger(Box::new(StatsCycleLogger::default()));
    controller.select_camera(settings.camera.index);

    let (tx, rx) = crossbeam_channel::unbounded();
    if cli.autostart {
        tx.send(ControlCommand::Start)?;
    }
    // The console may finish early when stdin closes; holding `tx` keeps
    // the loop alive until `quit`.
    console::spawn(tx.clone())?;
    println!("{}", console::HELP);

    controller.run(&rx);
    drop(tx);
    Ok(())
}

fn build_encoder(settings: &Settings) -> Result<OnnxFaceEncoder, Box<dyn std::error::Error>> {
    let bundled = settings.recognition.models_dir.as_deref();
    let detector = resolve_model(FACE_DETECTOR_MODEL, bundled)?;
    let embedder = resolve_model(FACE_EMBEDDING_MODEL, bundled)?;
    OnnxFaceEncoder::new(&detector, &embedder, settings.recognition.confidence)
}

fn resolve_model(
    model: ModelSpec,
    bundled: Option<&std::path::Path>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {}", model.name);
    let name = model.name;
    let progress: model_resolver::ProgressFn = Box::new(move |downloaded, total| {
        if total > 0 {
            let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
            eprint!("\rDownloading {name}... {pct}%");
        } else {
            eprint!("\rDownloading {name}... {downloaded} bytes");
        }
    });
    let path = model_resolver::resolve(model, bundled, Some(progress))?;
    Ok(path)
}

fn load_gallery(
    settings: &Settings,
    encoder: &mut OnnxFaceEncoder,
) -> Result<Gallery, Box<dyn std::error::Error>> {
    let loader = DirectoryGalleryLoader::new(&settings.gallery.extension);
    let gallery = loader.load(&settings.gallery.directory, encoder)?;
    if gallery.is_empty() {
        log::warn!(
            "No usable faces in {}; every decision will be a denial",
            settings.gallery.directory.display()
        );
    } else {
        let labels: Vec<_> = gallery.labels().collect();
        log::info!("Gallery: {} known face(s): {}", gallery.len(), labels.join(", "));
    }
    Ok(gallery)
}

fn build_store(
    settings: &Settings,
    dry_run: bool,
) -> Result<Box<dyn DecisionStore>, Box<dyn std::error::Error>> {
    if dry_run {
        log::info!("Dry run: decisions are kept in memory");
        return Ok(Box::new(MemoryStore::new()));
    }
    let config = settings.store.firebase_config()?;
    Ok(Box::new(FirebaseStore::new(config)?))
}

fn build_camera_backend(camera: &CameraSettings) -> FfmpegCameraBackend {
    let mut backend = FfmpegCameraBackend::new();
    if let Some(format) = &camera.input_format {
        backend = backend.with_input_format(format);
    }
    if let Some(template) = &camera.device_template {
        backend = backend.with_device_template(template);
    }
    if let Some(fps) = camera.framerate {
        backend = backend.with_framerate(fps);
    }
    backend
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flags_override_settings_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{ "camera": { "index": 0 }, "recognition": { "tolerance": 0.4 } }"#)
            .unwrap();
        let config = file.path().to_str().unwrap();

        let cli = Cli::try_parse_from([
            "facelock",
            "--config",
            config,
            "--camera",
            "1",
            "--gallery",
            "faces",
        ])
        .unwrap();
        let settings = cli.load_settings().unwrap();

        assert_eq!(settings.camera.index, 1);
        assert_eq!(settings.gallery.directory, PathBuf::from("faces"));
        assert_eq!(settings.recognition.tolerance, 0.4);
    }

    #[test]
    fn test_invalid_tolerance_flag_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("facelock.json");
        std::fs::write(&config, "{}").unwrap();

        let cli = Cli::try_parse_from([
            "facelock",
            "--config",
            config.to_str().unwrap(),
            "--tolerance=-1",
        ])
        .unwrap();
        assert!(cli.load_settings().is_err());
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        let cli =
            Cli::try_parse_from(["facelock", "--config", missing.to_str().unwrap()]).unwrap();
        assert!(cli.load_settings().is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["facelock"]).unwrap();
        assert!(!cli.dry_run);
        assert!(!cli.autostart);
        assert_eq!(cli.snapshot_every, 30);
        assert!(cli.snapshot.is_none());
    }

    #[test]
    fn test_dry_run_store_needs_no_url() {
        assert!(build_store(&Settings::default(), true).is_ok());
        assert!(build_store(&Settings::default(), false).is_err());
    }

    #[test]
    fn test_camera_backend_uses_configured_template() {
        let camera = CameraSettings {
            device_template: Some("/dev/cam{index}".into()),
            ..CameraSettings::default()
        };
        assert_eq!(build_camera_backend(&camera).device_name(2), "/dev/cam2");
    }
}
