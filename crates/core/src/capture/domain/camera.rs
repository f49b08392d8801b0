use crate::shared::frame::Frame;

/// Opens physical cameras by index.
pub trait CameraBackend: Send {
    fn open(&mut self, index: usize) -> Result<Box<dyn CameraDevice>, Box<dyn std::error::Error>>;
}

/// A camera that has been acquired and is producing frames.
///
/// `release` must be safe to call more than once. Implementations should
/// also release on drop.
pub trait CameraDevice: Send {
    /// Blocks until the next frame is available.
    fn read(&mut self) -> Result<Frame, Box<dyn std::error::Error>>;

    fn release(&mut self);
}
