use thiserror::Error;

use crate::capture::domain::camera::{CameraBackend, CameraDevice};
use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("camera {index} unavailable: {reason}")]
    CameraUnavailable { index: usize, reason: String },
    #[error("camera read failed: {0}")]
    ReadFailure(String),
    #[error("capture session is not open")]
    NotOpen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Open,
}

struct OpenCamera {
    index: usize,
    device: Box<dyn CameraDevice>,
}

/// Owns at most one acquired camera.
///
/// `Closed -> Open` only through [`open`](Self::open), `Open -> Closed` only
/// through [`close`](Self::close) (or drop). Reads never retry.
pub struct CaptureSession {
    backend: Box<dyn CameraBackend>,
    camera: Option<OpenCamera>,
}

impl CaptureSession {
    pub fn new(backend: Box<dyn CameraBackend>) -> Self {
        Self {
            backend,
            camera: None,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.camera.is_some() {
            SessionState::Open
        } else {
            SessionState::Closed
        }
    }

    pub fn camera_index(&self) -> Option<usize> {
        self.camera.as_ref().map(|c| c.index)
    }

    /// Acquires camera `index`.
    ///
    /// Already open on `index`: no-op. Open on another index: that camera is
    /// released first. On failure the session is left Closed.
    pub fn open(&mut self, index: usize) -> Result<(), CaptureError> {
        match self.camera_index() {
            Some(current) if current == index => return Ok(()),
            Some(_) => self.close(),
            None => {}
        }

        match self.backend.open(index) {
            Ok(device) => {
                log::info!("Camera {index} opened");
                self.camera = Some(OpenCamera { index, device });
                Ok(())
            }
            Err(e) => {
                log::warn!("Camera {index} unavailable: {e}");
                Err(CaptureError::CameraUnavailable {
                    index,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Releases the camera if one is held. Closing a closed session is a no-op.
    pub fn close(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            camera.device.release();
            log::info!("Camera {} released", camera.index);
        }
    }

    pub fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let camera = self.camera.as_mut().ok_or(CaptureError::NotOpen)?;
        camera
            .device
            .read()
            .map_err(|e| CaptureError::ReadFailure(e.to_string()))
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.close();
    }
}
