use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// How a status line should be presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Ok,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub severity: Severity,
}

impl Status {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Ok,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            severity: Severity::Error,
        }
    }
}

/// Everything a display needs to show after one loop step.
///
/// `frame` is absent when no image was captured (camera errors, session
/// open/close). `overlays` are in the frame's own pixel coordinates.
#[derive(Clone, Debug)]
pub struct RenderEvent {
    pub status: Status,
    pub frame: Option<Frame>,
    pub overlays: Vec<BoundingBox>,
}

impl RenderEvent {
    pub fn status_only(status: Status) -> Self {
        Self {
            status,
            frame: None,
            overlays: Vec::new(),
        }
    }
}

/// Display side of the recognition loop.
///
/// Rendering must not fail the loop; implementations log their own errors.
pub trait RenderSink: Send {
    fn render(&mut self, event: RenderEvent);
}
