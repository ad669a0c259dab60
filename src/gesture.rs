// Finger up/down classification from one hand's landmarks.
// Pure per-frame geometry: no smoothing, nothing remembered between frames.

use crate::error::Error;
use crate::types::{FingerState, Landmark};

pub const THUMB_TIP: usize = 4;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_TIP: usize = 12;
pub const RING_TIP: usize = 16;
pub const PINKY_TIP: usize = 20;

pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

/// Landmark with anatomical index `id`. A short hand, or one whose entries
/// are out of order, is an error.
pub fn landmark(landmarks: &[Landmark], id: usize) -> Result<Landmark, Error> {
    landmarks
        .get(id)
        .copied()
        .filter(|l| l.id == id)
        .ok_or(Error::MissingLandmark { index: id, len: landmarks.len() })
}

/// Which of the five fingers are extended.
///
/// The thumb folds sideways, so it is compared horizontally against the joint
/// just below its tip: "up" when the tip is further left (frame is mirrored).
/// The other fingers are "up" when the tip sits higher on screen (smaller y)
/// than the joint two indices below it.
pub fn fingers_up(landmarks: &[Landmark]) -> Result<FingerState, Error> {
    let mut state = [false; 5];

    let thumb_tip = landmark(landmarks, THUMB_TIP)?;
    let thumb_joint = landmark(landmarks, THUMB_TIP - 1)?;
    state[0] = thumb_tip.x < thumb_joint.x;

    for (slot, &tip_id) in FINGERTIPS.iter().enumerate().skip(1) {
        let tip = landmark(landmarks, tip_id)?;
        let joint = landmark(landmarks, tip_id - 2)?;
        state[slot] = tip.y < joint.y;
    }

    Ok(FingerState(state))
}
