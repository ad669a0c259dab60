// Hand skeleton overlay: bones between landmarks plus a dot on each joint.
// Drawn on the display frame only, never on the canvas.

use crate::draw::{draw_thick_line, fill_circle};
use crate::types::{FrameBuffer, Landmark, Rgb};

pub const CONNECTIONS: &[(usize, usize)] = &[
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 4),
    (0, 5),
    (5, 6),
    (6, 7),
    (7, 8),
    (0, 9),
    (9, 10),
    (10, 11),
    (11, 12),
    (0, 13),
    (13, 14),
    (14, 15),
    (15, 16),
    (0, 17),
    (17, 18),
    (18, 19),
    (19, 20),
    (5, 9),
    (9, 13),
    (13, 17),
];

const BONE_COLOR: Rgb = Rgb(224, 224, 224);
const JOINT_COLOR: Rgb = Rgb(255, 0, 0);
const BONE_THICKNESS: i32 = 2;
const JOINT_RADIUS: i32 = 3;

pub fn draw_skeleton(frame: &mut FrameBuffer, landmarks: &[Landmark]) {
    if landmarks.len() < 2 {
        return;
    }
    for &(a, b) in CONNECTIONS {
        if let (Some(pa), Some(pb)) = (landmarks.get(a), landmarks.get(b)) {
            draw_thick_line(frame, pa.point(), pb.point(), BONE_THICKNESS, BONE_COLOR);
        }
    }
    for lm in landmarks {
        fill_circle(frame, lm.point(), JOINT_RADIUS, JOINT_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joints_and_bones_are_drawn() {
        let lm: Vec<Landmark> = (0..21).map(|i| Landmark::new(i, 10 + 10 * i as i32, 50)).collect();
        let mut frame = FrameBuffer::black(240, 100);
        draw_skeleton(&mut frame, &lm);

        assert_eq!(frame.get(10, 50), Some(JOINT_COLOR.packed()));
        assert_eq!(frame.get(15, 50), Some(BONE_COLOR.packed()));
        assert_eq!(frame.get(15, 80), Some(0));
    }

    #[test]
    fn a_single_point_draws_nothing() {
        let mut frame = FrameBuffer::black(20, 20);
        draw_skeleton(&mut frame, &[Landmark::new(0, 5, 5)]);
        assert!(frame.pixels.iter().all(|&p| p == 0));
    }
}
