use std::path::PathBuf;

use facelock_core::pipeline::annotation::annotate;
use facelock_core::pipeline::render_sink::{RenderEvent, RenderSink, Severity, Status};

/// Periodically writes the latest annotated frame to one PNG path.
pub struct SnapshotWriter {
    path: PathBuf,
    every: u64,
    frames_seen: u64,
}

impl SnapshotWriter {
    pub fn new(path: PathBuf, every: u64) -> Self {
        Self {
            path,
            every: every.max(1),
            frames_seen: 0,
        }
    }

    fn offer(&mut self, event: &RenderEvent) {
        let Some(frame) = &event.frame else {
            return;
        };
        self.frames_seen += 1;
        if self.frames_seen % self.every != 0 {
            return;
        }

        let annotated = annotate(frame, &event.overlays);
        let Some(image) = annotated.to_rgb_image() else {
            log::warn!("Frame {} has an invalid buffer, snapshot skipped", frame.sequence());
            return;
        };
        match image.save_with_format(&self.path, image::ImageFormat::Png) {
            Ok(()) => log::debug!("Snapshot written to {}", self.path.display()),
            Err(e) => log::warn!("Failed to write snapshot {}: {e}", self.path.display()),
        }
    }
}

/// Headless presentation: status changes go to the log, frames optionally
/// to a snapshot file.
pub struct LogRenderSink {
    last_status: Option<Status>,
    snapshot: Option<SnapshotWriter>,
}

impl LogRenderSink {
    pub fn new(snapshot: Option<SnapshotWriter>) -> Self {
        Self {
            last_status: None,
            snapshot,
        }
    }

    pub fn last_status(&self) -> Option<&Status> {
        self.last_status.as_ref()
    }
}

impl RenderSink for LogRenderSink {
    fn render(&mut self, event: RenderEvent) {
        if self.last_status.as_ref() != Some(&event.status) {
            match event.status.severity {
                Severity::Ok => log::info!("{}", event.status.text),
                Severity::Error => log::warn!("{}", event.status.text),
            }
            self.last_status = Some(event.status.clone());
        }
        if let Some(snapshot) = &mut self.snapshot {
            snapshot.offer(&event);
        }
    }
}
