// Opens the webcam and converts frames into 0x00RRGGBB buffers for the painter.
// The stream is stopped when the capture is dropped, on every exit path.

use crate::app::FrameSource;
use crate::error::Error;
use crate::types::{FrameBuffer, Rgb};

use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

pub struct CameraCapture {
    cam: Camera,
    width: u32,
    height: u32,
}

impl CameraCapture {
    /// Open camera `index`, asking for `width`x`height` (the device may pick something close).
    pub fn new(index: u32, width: u32, height: u32) -> Result<Self, Error> {
        let fmt = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,
        );
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam = Camera::new(CameraIndex::Index(index), req)
            .map_err(|e| Error::CameraInit(format!("Create camera {index}: {e}")))?;

        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;

        let actual = cam.resolution();
        if actual.width() != width || actual.height() != height {
            log::warn!(
                "camera delivers {}x{} instead of requested {}x{}",
                actual.width(),
                actual.height(),
                width,
                height
            );
        }

        Ok(Self {
            cam,
            width: actual.width(),
            height: actual.height(),
        })
    }

    /// The resolution the camera actually delivers.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl FrameSource for CameraCapture {
    /// Grab one frame (blocks until the camera has one) as 0x00RRGGBB pixels.
    fn next_frame(&mut self) -> Result<FrameBuffer, Error> {
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("Fetch frame: {e}")))?;

        let rgb_img = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("Decode RGB: {e}")))?;

        let (w, h) = rgb_img.dimensions();
        let pixels = rgb_img
            .as_raw()
            .chunks_exact(3)
            .map(|p| Rgb(p[0], p[1], p[2]).packed())
            .collect();

        Ok(FrameBuffer {
            width: w as usize,
            height: h as usize,
            pixels,
        })
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        if let Err(e) = self.cam.stop_stream() {
            log::warn!("failed to stop camera stream: {e}");
        } else {
            log::info!("camera released");
        }
    }
}
