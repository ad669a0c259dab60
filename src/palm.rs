// Palm detection: finds where the hand is so the landmark model can look at
// a tight, upright crop instead of the whole frame.

use std::cmp::Ordering;
use std::f32::consts::PI;
use std::path::Path;

use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;

use crate::error::Error;
use crate::hand::{Letterbox, prepare_frame};
use crate::types::FrameBuffer;

pub const PALM_INPUT_SIZE: u32 = 192;
pub const NUM_ANCHORS: usize = 2016;
const PALM_LANDMARKS: usize = 7;

pub const DEFAULT_PALM_MODEL: &str = "models/palm_detection_mediapipe_2023feb.onnx";

/// A detected palm in frame pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct PalmRegion {
    pub bbox: [f32; 4],
    pub landmarks: Vec<(f32, f32)>,
    pub score: f32,
}

#[derive(Clone, Debug)]
pub struct PalmDetectorConfig {
    pub score_threshold: f32,
    pub nms_threshold: f32,
    pub top_k: usize,
}

impl Default for PalmDetectorConfig {
    fn default() -> Self {
        Self {
            score_threshold: 0.5,
            nms_threshold: 0.3,
            top_k: 32,
        }
    }
}

/// SSD anchor centers for the 192x192 palm model: a 24x24 grid with two
/// anchors per cell, then a 12x12 grid with six.
pub fn anchors() -> Vec<[f32; 2]> {
    let mut out = Vec::with_capacity(NUM_ANCHORS);
    for (grid, per_cell) in [(24usize, 2usize), (12, 6)] {
        for y in 0..grid {
            for x in 0..grid {
                let center = [
                    (x as f32 + 0.5) / grid as f32,
                    (y as f32 + 0.5) / grid as f32,
                ];
                out.extend(std::iter::repeat_n(center, per_cell));
            }
        }
    }
    out
}

pub struct PalmDetector {
    session: Session,
    cfg: PalmDetectorConfig,
    anchors: Vec<[f32; 2]>,
}

impl PalmDetector {
    pub fn new(model_path: &Path, cfg: PalmDetectorConfig) -> Result<Self, Error> {
        if !model_path.exists() {
            return Err(Error::Model(format!(
                "palm model not found at {}",
                model_path.display()
            )));
        }
        let session = Session::builder()
            .map_err(|e| Error::Model(format!("Create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| Error::Model(format!("Set optimization level: {e}")))?
            .with_intra_threads(2)
            .map_err(|e| Error::Model(format!("Set intra threads: {e}")))?
            .commit_from_file(model_path)
            .map_err(|e| Error::Model(format!("Load {}: {e}", model_path.display())))?;

        log::info!("palm detector ready: {}", model_path.display());
        Ok(Self { session, cfg, anchors: anchors() })
    }

    pub fn detect(&mut self, frame: &FrameBuffer) -> Result<Vec<PalmRegion>, Error> {
        let (input, letterbox) = prepare_frame(frame, PALM_INPUT_SIZE)?;
        let tensor = Tensor::from_array(input)
            .map_err(|e| Error::Inference(format!("Build palm tensor: {e}")))?;
        let outputs = self
            .session
            .run(ort::inputs![tensor])
            .map_err(|e| Error::Inference(format!("Run palm detector: {e}")))?;

        if outputs.len() < 2 {
            return Err(Error::Inference(format!(
                "palm detector returned {} outputs, expected at least 2",
                outputs.len()
            )));
        }

        let boxes = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| Error::Inference(format!("Read palm boxes: {e}")))?;
        let scores = outputs[1]
            .try_extract_array::<f32>()
            .map_err(|e| Error::Inference(format!("Read palm scores: {e}")))?;

        let box_shape = boxes.shape().to_vec();
        let score_shape = scores.shape().to_vec();
        let boxes: Vec<f32> = boxes.iter().copied().collect();
        let scores: Vec<f32> = scores.iter().copied().collect();

        decode_palms(
            &boxes,
            &box_shape,
            &scores,
            &score_shape,
            &self.anchors,
            &letterbox,
            &self.cfg,
        )
    }
}

/// Turn raw anchor offsets and logits into palms in frame pixels, best first.
pub fn decode_palms(
    boxes: &[f32],
    box_shape: &[usize],
    scores: &[f32],
    score_shape: &[usize],
    anchors: &[[f32; 2]],
    letterbox: &Letterbox,
    cfg: &PalmDetectorConfig,
) -> Result<Vec<PalmRegion>, Error> {
    let (&[.., anchor_dim, feature_dim], &[.., score_anchor_dim, score_dim]) =
        (box_shape, score_shape)
    else {
        return Err(Error::Inference(format!(
            "unexpected palm output shapes {box_shape:?} / {score_shape:?}"
        )));
    };
    if feature_dim < 4 + PALM_LANDMARKS * 2 || score_dim == 0 {
        return Err(Error::Inference(format!(
            "palm feature dimension too small: {feature_dim}"
        )));
    }
    if anchor_dim != score_anchor_dim {
        return Err(Error::Inference(format!(
            "anchor count mismatch between boxes ({anchor_dim}) and scores ({score_anchor_dim})"
        )));
    }
    if boxes.len() < anchor_dim * feature_dim || scores.len() < anchor_dim * score_dim {
        return Err(Error::Inference("palm outputs shorter than their shapes".into()));
    }

    let pad_bias_x = letterbox.pad_x / letterbox.scale;
    let pad_bias_y = letterbox.pad_y / letterbox.scale;
    let scale = letterbox.orig_w.max(letterbox.orig_h) as f32;
    let input = PALM_INPUT_SIZE as f32;
    let to_frame = |v: f32, anchor: f32, bias: f32| (v / input + anchor) * scale - bias;

    let mut candidates = Vec::new();
    for (i, anchor) in anchors.iter().enumerate().take(anchor_dim) {
        let score = sigmoid(scores[i * score_dim]);
        if score < cfg.score_threshold {
            continue;
        }

        let f = &boxes[i * feature_dim..(i + 1) * feature_dim];
        let (cx, cy) = (f[0] / input + anchor[0], f[1] / input + anchor[1]);
        let (hw, hh) = (f[2] / input / 2.0, f[3] / input / 2.0);
        let max_x = letterbox.orig_w.saturating_sub(1) as f32;
        let max_y = letterbox.orig_h.saturating_sub(1) as f32;
        let x1 = (cx - hw) * scale - pad_bias_x;
        let y1 = (cy - hh) * scale - pad_bias_y;
        let x2 = (cx + hw) * scale - pad_bias_x;
        let y2 = (cy + hh) * scale - pad_bias_y;
        if x2 <= x1 || y2 <= y1 {
            continue;
        }

        let landmarks = (0..PALM_LANDMARKS)
            .map(|l| {
                (
                    to_frame(f[4 + l * 2], anchor[0], pad_bias_x),
                    to_frame(f[4 + l * 2 + 1], anchor[1], pad_bias_y),
                )
            })
            .collect();

        candidates.push(PalmRegion {
            bbox: [
                x1.clamp(0.0, max_x),
                y1.clamp(0.0, max_y),
                x2.clamp(0.0, max_x),
                y2.clamp(0.0, max_y),
            ],
            landmarks,
            score,
        });
    }

    Ok(nms(candidates, cfg.nms_threshold, cfg.top_k))
}

/// Square crop around the palm: center, side length, and rotation that turns
/// the palm upright.
pub fn crop_from_palm(region: &PalmRegion) -> ((f32, f32), f32, f32) {
    let center = if region.landmarks.is_empty() {
        (
            (region.bbox[0] + region.bbox[2]) * 0.5,
            (region.bbox[1] + region.bbox[3]) * 0.5,
        )
    } else {
        let n = region.landmarks.len() as f32;
        let (sx, sy) = region
            .landmarks
            .iter()
            .fold((0.0_f32, 0.0_f32), |acc, p| (acc.0 + p.0, acc.1 + p.1));
        (sx / n, sy / n)
    };

    let base_w = (region.bbox[2] - region.bbox[0]).abs();
    let base_h = (region.bbox[3] - region.bbox[1]).abs();
    let span = region
        .landmarks
        .iter()
        .fold(None, |acc: Option<(f32, f32, f32, f32)>, &(x, y)| {
            Some(match acc {
                None => (x, x, y, y),
                Some((a, b, c, d)) => (a.min(x), b.max(x), c.min(y), d.max(y)),
            })
        })
        .map_or(0.0, |(min_x, max_x, min_y, max_y)| (max_x - min_x).max(max_y - min_y));
    // Fingers extend well past the palm box.
    let side = base_w.max(base_h).max(span).max(80.0) * 2.4;

    (center, side, estimate_orientation(region))
}

/// Principal axis of the palm keypoints, rotated so the hand points up.
pub fn estimate_orientation(region: &PalmRegion) -> f32 {
    if region.landmarks.len() < 2 {
        return 0.0;
    }
    let n = region.landmarks.len() as f32;
    let (sx, sy) = region
        .landmarks
        .iter()
        .fold((0.0_f32, 0.0_f32), |acc, (x, y)| (acc.0 + x, acc.1 + y));
    let mean = (sx / n, sy / n);

    let (mut cov_xx, mut cov_xy, mut cov_yy) = (0.0_f32, 0.0_f32, 0.0_f32);
    for (x, y) in &region.landmarks {
        let (dx, dy) = (x - mean.0, y - mean.1);
        cov_xx += dx * dx;
        cov_xy += dx * dy;
        cov_yy += dy * dy;
    }
    cov_xx /= n;
    cov_xy /= n;
    cov_yy /= n;

    let trace = cov_xx + cov_yy;
    let det = cov_xx * cov_yy - cov_xy * cov_xy;
    let lambda1 = (trace * 0.5 + ((trace * 0.5).powi(2) - det).max(0.0).sqrt()).max(1e-6);
    let (vx, vy) = if cov_xy.abs() > 1e-6 {
        (lambda1 - cov_yy, cov_xy)
    } else if cov_xx >= cov_yy {
        (1.0, 0.0)
    } else {
        (0.0, 1.0)
    };

    vy.atan2(vx) - PI * 0.5
}

/// Greedy non-maximum suppression; returns survivors, highest score first.
fn nms(mut candidates: Vec<PalmRegion>, threshold: f32, top_k: usize) -> Vec<PalmRegion> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    let mut keep: Vec<PalmRegion> = Vec::new();
    for c in candidates {
        if keep.len() >= top_k {
            break;
        }
        if keep.iter().all(|k| iou(&c.bbox, &k.bbox) < threshold) {
            keep.push(c);
        }
    }
    keep
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let inter_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let inter_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = inter_w * inter_h;
    if inter <= 0.0 {
        return 0.0;
    }
    let area_a = (a[2] - a[0]).max(0.0) * (a[3] - a[1]).max(0.0);
    let area_b = (b[2] - b[0]).max(0.0) * (b[3] - b[1]).max(0.0);
    let union = area_a + area_b - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEATURES: usize = 4 + PALM_LANDMARKS * 2;

    fn square_letterbox() -> Letterbox {
        Letterbox { scale: 1.0, pad_x: 0.0, pad_y: 0.0, orig_w: 192, orig_h: 192 }
    }

    /// Raw outputs where only `hot` anchors fire, each with a 40x40 box.
    fn outputs(hot: &[(usize, f32)]) -> (Vec<f32>, Vec<f32>) {
        let mut boxes = vec![0.0; NUM_ANCHORS * FEATURES];
        let mut scores = vec![-10.0; NUM_ANCHORS];
        for &(i, logit) in hot {
            scores[i] = logit;
            boxes[i * FEATURES + 2] = 40.0;
            boxes[i * FEATURES + 3] = 40.0;
        }
        (boxes, scores)
    }

    fn decode(boxes: &[f32], scores: &[f32]) -> Vec<PalmRegion> {
        decode_palms(
            boxes,
            &[1, NUM_ANCHORS, FEATURES],
            scores,
            &[1, NUM_ANCHORS, 1],
            &anchors(),
            &square_letterbox(),
            &PalmDetectorConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn anchor_layout_matches_the_palm_model() {
        let a = anchors();
        assert_eq!(a.len(), NUM_ANCHORS);
        assert_eq!(a[0], [0.5 / 24.0, 0.5 / 24.0]);
        assert_eq!(a[1], a[0]);
        assert_eq!(a[2], [1.5 / 24.0, 0.5 / 24.0]);
        assert_eq!(a[24 * 24 * 2], [0.5 / 12.0, 0.5 / 12.0]);
        assert_eq!(a[NUM_ANCHORS - 1], [11.5 / 12.0, 11.5 / 12.0]);
    }

    #[test]
    fn decodes_box_around_anchor_center() {
        let (boxes, scores) = outputs(&[(0, 4.0)]);
        let palms = decode(&boxes, &scores);

        assert_eq!(palms.len(), 1);
        let [x1, y1, x2, y2] = palms[0].bbox;
        // Anchor 0 sits at (4,4) in a 192 frame; the box is clamped at 0.
        assert_eq!((x1, y1), (0.0, 0.0));
        assert!((x2 - 24.0).abs() < 1e-3 && (y2 - 24.0).abs() < 1e-3);
        assert!(palms[0].score > 0.98);
        assert_eq!(palms[0].landmarks.len(), PALM_LANDMARKS);
    }

    #[test]
    fn weak_and_overlapping_detections_are_dropped() {
        // Anchors 0 and 1 share a cell: same box, so the weaker is suppressed.
        let (boxes, scores) = outputs(&[(0, 2.0), (1, 3.0), (2000, -1.0)]);
        let palms = decode(&boxes, &scores);
        assert_eq!(palms.len(), 1);
        assert!((palms[0].score - sigmoid(3.0)).abs() < 1e-6);
    }

    #[test]
    fn bad_shapes_are_errors() {
        let err = decode_palms(
            &[0.0; 10],
            &[1, 5, 2],
            &[0.0; 5],
            &[1, 5, 1],
            &anchors(),
            &square_letterbox(),
            &PalmDetectorConfig::default(),
        );
        assert!(matches!(err, Err(Error::Inference(_))));
    }

    #[test]
    fn crop_covers_the_palm_generously() {
        let region = PalmRegion {
            bbox: [100.0, 100.0, 200.0, 180.0],
            landmarks: vec![],
            score: 0.9,
        };
        let (center, side, angle) = crop_from_palm(&region);
        assert_eq!(center, (150.0, 140.0));
        assert!((side - 240.0).abs() < 1e-3);
        assert_eq!(angle, 0.0);
    }

    #[test]
    fn vertical_palm_needs_no_rotation() {
        let region = PalmRegion {
            bbox: [0.0, 0.0, 10.0, 10.0],
            landmarks: vec![(50.0, 0.0), (50.0, 40.0), (50.0, 80.0)],
            score: 0.9,
        };
        assert!(estimate_orientation(&region).abs() < 1e-5);
    }
}
