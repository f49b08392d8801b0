use crate::capture::domain::camera::{CameraBackend, CameraDevice};
use crate::shared::frame::Frame;

#[cfg(target_os = "linux")]
const DEFAULT_INPUT_FORMAT: &str = "v4l2";
#[cfg(target_os = "macos")]
const DEFAULT_INPUT_FORMAT: &str = "avfoundation";
#[cfg(target_os = "windows")]
const DEFAULT_INPUT_FORMAT: &str = "dshow";
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const DEFAULT_INPUT_FORMAT: &str = "video4linux2";

#[cfg(target_os = "linux")]
const DEFAULT_DEVICE_TEMPLATE: &str = "/dev/video{index}";
#[cfg(target_os = "windows")]
const DEFAULT_DEVICE_TEMPLATE: &str = "video={index}";
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
const DEFAULT_DEVICE_TEMPLATE: &str = "{index}";

/// Placeholder replaced by the camera index in a device template.
pub const INDEX_PLACEHOLDER: &str = "{index}";

/// Opens cameras through libavdevice (v4l2 / avfoundation / dshow).
///
/// The device name is built from a template such as `/dev/video{index}`.
pub struct FfmpegCameraBackend {
    input_format: String,
    device_template: String,
    framerate: Option<u32>,
}

impl FfmpegCameraBackend {
    pub fn new() -> Self {
        Self {
            input_format: DEFAULT_INPUT_FORMAT.to_string(),
            device_template: DEFAULT_DEVICE_TEMPLATE.to_string(),
            framerate: None,
        }
    }

    pub fn with_input_format(mut self, format: &str) -> Self {
        self.input_format = format.to_string();
        self
    }

    pub fn with_device_template(mut self, template: &str) -> Self {
        self.device_template = template.to_string();
        self
    }

    pub fn with_framerate(mut self, fps: u32) -> Self {
        self.framerate = Some(fps);
        self
    }

    pub fn device_name(&self, index: usize) -> String {
        self.device_template
            .replace(INDEX_PLACEHOLDER, &index.to_string())
    }
}

impl Default for FfmpegCameraBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for FfmpegCameraBackend {
    fn open(&mut self, index: usize) -> Result<Box<dyn CameraDevice>, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let format = ffmpeg_next::device::input::video()
            .find(|f| f.name() == self.input_format)
            .ok_or_else(|| format!("capture format '{}' not available", self.input_format))?;

        let mut options = ffmpeg_next::Dictionary::new();
        if let Some(fps) = self.framerate {
            options.set("framerate", &fps.to_string());
        }

        let device = self.device_name(index);
        log::debug!("Opening {device} via {}", self.input_format);
        let ictx = ffmpeg_next::format::open_with(
            &device,
            &ffmpeg_next::format::Format::Input(format),
            options,
        )?
        .input();

        Ok(Box::new(FfmpegCameraDevice::new(ictx)?))
    }
}

/// A live capture stream decoded to RGB24.
pub struct FfmpegCameraDevice {
    input_ctx: Option<ffmpeg_next::format::context::Input>,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
    sequence: u64,
}

// Safety: the device is owned by one capture session and only used from the
// thread driving that session; ffmpeg pointers are never shared.
unsafe impl Send for FfmpegCameraDevice {}

impl FfmpegCameraDevice {
    fn new(ictx: ffmpeg_next::format::context::Input) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("capture device has no video stream")?;
        let stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;
        log::info!("Capture stream {width}x{height}");

        Ok(Self {
            input_ctx: Some(ictx),
            decoder,
            scaler,
            stream_index,
            width,
            height,
            sequence: 0,
        })
    }

    fn try_receive(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&decoded, &mut rgb)?;
        let pixels = extract_rgb_pixels(&rgb, self.width, self.height);
        self.sequence += 1;
        Ok(Some(Frame::new(pixels, self.width, self.height, self.sequence)))
    }
}

impl CameraDevice for FfmpegCameraDevice {
    fn read(&mut self) -> Result<Frame, Box<dyn std::error::Error>> {
        if let Some(frame) = self.try_receive()? {
            return Ok(frame);
        }
        loop {
            let ictx = self.input_ctx.as_mut().ok_or("camera released")?;
            let Some((stream, packet)) = ictx.packets().next() else {
                return Err("end of stream".into());
            };
            if stream.index() != self.stream_index {
                continue;
            }
            self.decoder.send_packet(&packet)?;
            if let Some(frame) = self.try_receive()? {
                return Ok(frame);
            }
        }
    }

    fn release(&mut self) {
        self.input_ctx = None;
    }
}

impl Drop for FfmpegCameraDevice {
    fn drop(&mut self) {
        self.release();
    }
}

/// Copies RGB24 rows out of a possibly padded ffmpeg frame.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_bytes = width as usize * 3;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + row_bytes]);
    }
    pixels
}
