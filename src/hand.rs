// Hand landmark detection: hands a camera frame to a pretrained model and
// returns the 21 keypoints of the hand in frame pixel coordinates.

use std::path::Path;

use image::{RgbImage, imageops::FilterType};
use ndarray::Array4;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use crate::error::Error;
use crate::palm::{PalmDetector, PalmDetectorConfig, crop_from_palm};
use crate::types::{FrameBuffer, Landmark, Rgb};

pub const INPUT_SIZE: u32 = 224;
pub const NUM_LANDMARKS: usize = 21;

pub const DEFAULT_MODEL: &str = "models/handpose_estimation_mediapipe_2023feb.onnx";

/// Anything that can find a hand in a frame.
/// An empty Vec means "no hand this frame"; that is not an error.
pub trait LandmarkProvider {
    fn detect(&mut self, frame: &FrameBuffer) -> Result<Vec<Landmark>, Error>;
}

/// Raw model output for one frame, before the confidence cut.
#[derive(Clone, Debug)]
pub struct HandposeOutput {
    pub projected: Vec<(f32, f32)>,
    pub confidence: f32,
}

impl HandposeOutput {
    /// Keypoints in frame pixels, or nothing if the model isn't confident enough.
    pub fn landmarks(&self, min_confidence: f32) -> Vec<Landmark> {
        if self.confidence < min_confidence || self.projected.len() < NUM_LANDMARKS {
            return Vec::new();
        }
        self.projected
            .iter()
            .take(NUM_LANDMARKS)
            .enumerate()
            .map(|(id, &(x, y))| Landmark::new(id, x as i32, y as i32))
            .collect()
    }
}

/// How the frame was scaled and padded into the square model input.
#[derive(Clone, Debug, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    pub pad_x: f32,
    pub pad_y: f32,
    pub orig_w: usize,
    pub orig_h: usize,
}

/// Scale the frame to fit `target` x `target` (keeping aspect), pad with
/// black, and normalise to an NHWC float tensor in [0,1].
pub fn prepare_frame(frame: &FrameBuffer, target: u32) -> Result<(Array4<f32>, Letterbox), Error> {
    let mut raw = Vec::with_capacity(frame.pixels.len() * 3);
    for &px in &frame.pixels {
        let Rgb(r, g, b) = Rgb::unpack(px);
        raw.extend_from_slice(&[r, g, b]);
    }
    let Some(img) = RgbImage::from_raw(frame.width as u32, frame.height as u32, raw) else {
        return Err(Error::Inference("frame buffer does not match its dimensions".into()));
    };

    let scale = target as f32 / (frame.width.max(frame.height).max(1) as f32);
    let new_w = (frame.width as f32 * scale).round().max(1.0) as u32;
    let new_h = (frame.height as f32 * scale).round().max(1.0) as u32;
    let resized = image::imageops::resize(&img, new_w, new_h, FilterType::Triangle);

    let pad_x = ((target as i64 - new_w as i64) / 2).max(0) as f32;
    let pad_y = ((target as i64 - new_h as i64) / 2).max(0) as f32;

    let mut input = Array4::<f32>::zeros((1, target as usize, target as usize, 3));
    for (x, y, px) in resized.enumerate_pixels() {
        let lx = (x as f32 + pad_x) as usize;
        let ly = (y as f32 + pad_y) as usize;
        if lx < target as usize && ly < target as usize {
            for c in 0..3 {
                input[[0, ly, lx, c]] = px[c] as f32 / 255.0;
            }
        }
    }

    let letterbox = Letterbox {
        scale,
        pad_x,
        pad_y,
        orig_w: frame.width,
        orig_h: frame.height,
    };
    Ok((input, letterbox))
}

/// A rotated square window of the frame, resampled to `output_size` pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct CropTransform {
    pub center: (f32, f32),
    pub side: f32,
    pub angle: f32,
    pub output_size: u32,
    pub orig_w: usize,
    pub orig_h: usize,
}

impl CropTransform {
    /// Crop pixel -> frame pixel, unclamped.
    fn to_frame(&self, x: f32, y: f32) -> (f32, f32) {
        let half = self.output_size as f32 / 2.0;
        let scale = self.side / self.output_size as f32;
        let (dx, dy) = ((x - half) * scale, (y - half) * scale);
        let (sin, cos) = self.angle.sin_cos();
        (
            self.center.0 + dx * cos - dy * sin,
            self.center.1 + dx * sin + dy * cos,
        )
    }

    /// Crop pixel -> frame pixel, clamped to the frame.
    pub fn project(&self, x: f32, y: f32) -> (f32, f32) {
        let (ox, oy) = self.to_frame(x, y);
        (
            ox.clamp(0.0, self.orig_w.saturating_sub(1) as f32),
            oy.clamp(0.0, self.orig_h.saturating_sub(1) as f32),
        )
    }
}

/// Cut the rotated square around the palm out of the frame with bilinear
/// sampling. Outside the frame reads as black.
pub fn prepare_rotated_crop(
    frame: &FrameBuffer,
    center: (f32, f32),
    side: f32,
    angle: f32,
    output_size: u32,
) -> Result<(Array4<f32>, CropTransform), Error> {
    if frame.pixels.len() != frame.width * frame.height {
        return Err(Error::Inference("frame buffer does not match its dimensions".into()));
    }
    let transform = CropTransform {
        center,
        side,
        angle,
        output_size,
        orig_w: frame.width,
        orig_h: frame.height,
    };

    let n = output_size as usize;
    let mut input = Array4::<f32>::zeros((1, n, n, 3));
    for y in 0..n {
        for x in 0..n {
            let (sx, sy) = transform.to_frame(x as f32 + 0.5, y as f32 + 0.5);
            let rgb = sample_rgb(frame, sx, sy);
            for c in 0..3 {
                input[[0, y, x, c]] = rgb[c];
            }
        }
    }
    Ok((input, transform))
}

fn sample_rgb(frame: &FrameBuffer, x: f32, y: f32) -> [f32; 3] {
    if x.is_nan() || y.is_nan() {
        return [0.0; 3];
    }
    let fetch = |cx: f32, cy: f32| -> [f32; 3] {
        let (ix, iy) = (cx as i64, cy as i64);
        if ix < 0 || iy < 0 || ix >= frame.width as i64 || iy >= frame.height as i64 {
            return [0.0; 3];
        }
        let Rgb(r, g, b) = Rgb::unpack(frame.pixels[iy as usize * frame.width + ix as usize]);
        [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0]
    };

    // Pixel centers sit at +0.5.
    let (x, y) = (x - 0.5, y - 0.5);
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let c00 = fetch(x0, y0);
    let c10 = fetch(x0 + 1.0, y0);
    let c01 = fetch(x0, y0 + 1.0);
    let c11 = fetch(x0 + 1.0, y0 + 1.0);

    let lerp = |a: f32, b: f32, t: f32| a + (b - a) * t;
    std::array::from_fn(|c| lerp(lerp(c00[c], c10[c], fx), lerp(c01[c], c11[c], fx), fy))
}

/// Split the flat model output into (x, y, z) triples in model-input pixels.
pub fn decode_landmarks(flat: &[f32]) -> Result<Vec<[f32; 3]>, Error> {
    if flat.len() < NUM_LANDMARKS * 3 {
        return Err(Error::Inference(format!(
            "unexpected landmarks length: got {}, need {}",
            flat.len(),
            NUM_LANDMARKS * 3
        )));
    }
    Ok(flat
        .chunks_exact(3)
        .take(NUM_LANDMARKS)
        .map(|c| [c[0], c[1], c[2]])
        .collect())
}

/// Crop pixels back to frame pixels, clamped to the frame.
pub fn project_landmarks(points: &[[f32; 3]], transform: &CropTransform) -> Vec<(f32, f32)> {
    points.iter().map(|[x, y, _z]| transform.project(*x, *y)).collect()
}

/// MediaPipe palm detector + handpose model running on ONNX Runtime.
/// The palm stage finds the hand; the handpose stage sees only an upright
/// crop around it.
pub struct OrtHandpose {
    session: Session,
    palm: PalmDetector,
    min_confidence: f32,
}

impl OrtHandpose {
    pub fn new(
        model_path: &Path,
        palm_model_path: &Path,
        palm_threshold: f32,
        min_confidence: f32,
    ) -> Result<Self, Error> {
        if !model_path.exists() {
            return Err(Error::Model(format!("model not found at {}", model_path.display())));
        }
        let palm = PalmDetector::new(
            palm_model_path,
            PalmDetectorConfig { score_threshold: palm_threshold, ..Default::default() },
        )?;
        let session = Session::builder()
            .map_err(|e| Error::Model(format!("Create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| Error::Model(format!("Set optimization level: {e}")))?
            .with_intra_threads(2)
            .map_err(|e| Error::Model(format!("Set intra threads: {e}")))?
            .commit_from_file(model_path)
            .map_err(|e| Error::Model(format!("Load {}: {e}", model_path.display())))?;

        log::info!("handpose model ready: {}", model_path.display());
        Ok(Self { session, palm, min_confidence })
    }

    fn infer(&mut self, frame: &FrameBuffer) -> Result<Option<HandposeOutput>, Error> {
        let palms = self.palm.detect(frame)?;
        // Best-scoring palm first.
        let Some(primary) = palms.first() else {
            return Ok(None);
        };
        let (center, side, angle) = crop_from_palm(primary);

        let (input, transform) = prepare_rotated_crop(frame, center, side, angle, INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)
            .map_err(|e| Error::Inference(format!("Build input tensor: {e}")))?;
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| Error::Inference(format!("Run session: {e}")))?;

        if outputs.len() < 1 {
            return Err(Error::Inference("model returned no outputs".into()));
        }

        let coords = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| Error::Inference(format!("Read landmarks: {e}")))?;
        let flat: Vec<f32> = coords.iter().copied().collect();
        let points = decode_landmarks(&flat)?;

        let confidence = if outputs.len() > 1 {
            outputs[1]
                .try_extract_array::<f32>()
                .ok()
                .and_then(|arr| arr.iter().next().copied())
                .unwrap_or(0.0)
        } else {
            0.0
        };

        Ok(Some(HandposeOutput {
            projected: project_landmarks(&points, &transform),
            // A doubtful palm makes for a doubtful hand.
            confidence: (confidence * primary.score).clamp(0.0, 1.0),
        }))
    }
}

impl LandmarkProvider for OrtHandpose {
    fn detect(&mut self, frame: &FrameBuffer) -> Result<Vec<Landmark>, Error> {
        Ok(self
            .infer(frame)?
            .map(|out| out.landmarks(self.min_confidence))
            .unwrap_or_default())
    }
}
