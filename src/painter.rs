// Turns the current hand pose into painting actions.
// The mode is re-derived from scratch every frame; only the tool settings and
// the cursor trail carry over between frames, inside `Session`.

use crate::draw::{draw_rect, draw_text_5x7, draw_thick_line, fill_circle, fill_rect};
use crate::error::Error;
use crate::gesture::{fingers_up, landmark, INDEX_TIP, MIDDLE_TIP, THUMB_TIP};
use crate::toolbar::{Toolbar, HEADER_HEIGHT};
use crate::types::{FingerState, FrameBuffer, Landmark, Rgb};

/// Thumb-to-index distance range (pixels) that the size gesture responds to.
pub const PINCH_RANGE: [f32; 2] = [30.0, 200.0];
pub const PEN_RANGE: [f32; 2] = [6.0, 25.0];
pub const ERASER_RANGE: [f32; 2] = [50.0, 200.0];

const CURSOR_RADIUS: i32 = 15;
const PINCH_LINE_THICKNESS: i32 = 3;

// Size gauge on the right-hand side of the screen.
const GAUGE_TOP_LEFT: (i32, i32) = (1195, 297);
const GAUGE_BOTTOM_RIGHT: (i32, i32) = (1230, 547);
const GAUGE_LABEL: (i32, i32) = (1185, 597);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Idle,
    /// Thumb + index: pinch distance sets the brush and eraser size.
    SizeAdjust,
    /// Index + middle: point at the toolbar to pick a tool.
    Select,
    /// Index only: paint (or erase) along the fingertip path.
    Draw,
}

impl Mode {
    pub fn from_fingers(f: FingerState) -> Self {
        if f.thumb() && f.index() && f.rest_down() {
            Mode::SizeAdjust
        } else if f.index() && f.middle() {
            Mode::Select
        } else if f.index() && f.rest_down() {
            Mode::Draw
        } else {
            Mode::Idle
        }
    }
}

/// Piecewise-linear map of `x` from `from` onto `to`, clamped at both ends.
pub fn interp(x: f32, from: [f32; 2], to: [f32; 2]) -> f32 {
    if x <= from[0] {
        return to[0];
    }
    if x >= from[1] {
        return to[1];
    }
    to[0] + (x - from[0]) * (to[1] - to[0]) / (from[1] - from[0])
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrushSize {
    pub pen: i32,
    pub eraser: i32,
    /// 0..=100, shown on the gauge.
    pub percent: i32,
}

/// Brush and eraser size for a given thumb-to-index distance.
pub fn size_from_distance(distance: f32) -> BrushSize {
    BrushSize {
        pen: interp(distance, PINCH_RANGE, PEN_RANGE) as i32,
        eraser: interp(distance, PINCH_RANGE, ERASER_RANGE) as i32,
        percent: interp(distance, PINCH_RANGE, [0.0, 100.0]) as i32,
    }
}

/// Everything the painter remembers between frames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub slot: usize,
    pub color: Rgb,
    pub pen_thickness: i32,
    pub eraser_size: i32,
    /// Where the fingertip was last drawing frame; None breaks the stroke.
    pub trail: Option<(i32, i32)>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            slot: 0,
            color: Rgb(0, 0, 255),
            pen_thickness: 6,
            eraser_size: 110,
            trail: None,
        }
    }
}

impl Session {
    /// Stroke width for the current tool.
    pub fn stroke_width(&self) -> i32 {
        if self.color.is_eraser() { self.eraser_size } else { self.pen_thickness }
    }

    /// Apply this frame's hand pose. Returns the mode it was in, or None with no hand.
    /// Visual: cursors/gauge go on `frame`; strokes go on both `frame` and `canvas`.
    pub fn update(
        &mut self,
        landmarks: &[Landmark],
        frame: &mut FrameBuffer,
        canvas: &mut FrameBuffer,
        toolbar: &Toolbar,
    ) -> Result<Option<Mode>, Error> {
        if landmarks.is_empty() {
            self.trail = None;
            return Ok(None);
        }

        let thumb = landmark(landmarks, THUMB_TIP)?.point();
        let index = landmark(landmarks, INDEX_TIP)?.point();
        let middle = landmark(landmarks, MIDDLE_TIP)?.point();
        let mode = Mode::from_fingers(fingers_up(landmarks)?);

        match mode {
            Mode::SizeAdjust => {
                self.trail = None;
                let dx = (index.0 - thumb.0) as f32;
                let dy = (index.1 - thumb.1) as f32;
                let size = size_from_distance(dx.hypot(dy));
                self.pen_thickness = size.pen;
                self.eraser_size = size.eraser;

                draw_thick_line(frame, thumb, index, PINCH_LINE_THICKNESS, Rgb::MAGENTA);
                self.draw_gauge(frame, size.percent);
            }
            Mode::Select => {
                self.trail = None;
                let mid = ((index.0 + middle.0) / 2, (index.1 + middle.1) / 2);
                fill_circle(frame, mid, CURSOR_RADIUS, self.color);

                if index.1 < HEADER_HEIGHT as i32 {
                    if let Some(slot) = toolbar.hit_test(index.0, index.1) {
                        self.select(toolbar, slot);
                    }
                }
            }
            Mode::Draw => {
                fill_circle(frame, index, CURSOR_RADIUS, self.color);
                let from = self.trail.unwrap_or(index);
                let width = self.stroke_width();
                draw_thick_line(frame, from, index, width, self.color);
                draw_thick_line(canvas, from, index, width, self.color);
                self.trail = Some(index);
            }
            Mode::Idle => {
                self.trail = None;
            }
        }

        Ok(Some(mode))
    }

    fn select(&mut self, toolbar: &Toolbar, slot: usize) {
        if let Some(tool) = toolbar.slot(slot) {
            if self.slot != slot {
                log::debug!("selected tool {slot} ({:?})", tool.color);
            }
            self.slot = slot;
            self.color = tool.color;
        }
    }

    /// Visual: vertical bar that fills from the bottom, with "NN %" below it.
    fn draw_gauge(&self, frame: &mut FrameBuffer, percent: i32) {
        let (left, top) = GAUGE_TOP_LEFT;
        let (right, bottom) = GAUGE_BOTTOM_RIGHT;
        draw_rect(frame, (left, top), (right, bottom), 3, self.color);
        let level = (bottom as f32 - percent as f32 * 2.5) as i32;
        fill_rect(frame, (left, level), (right, bottom), self.color);
        draw_text_5x7(
            frame,
            GAUGE_LABEL.0,
            GAUGE_LABEL.1 - 21,
            &format!("{percent} %"),
            3,
            self.color.packed(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::tests::hand;

    const INDEX_ONLY: [bool; 5] = [false, true, false, false, false];
    const INDEX_MIDDLE: [bool; 5] = [false, true, true, false, false];
    const THUMB_INDEX: [bool; 5] = [true, true, false, false, false];

    fn setup() -> (Session, FrameBuffer, FrameBuffer, Toolbar) {
        (
            Session::default(),
            FrameBuffer::black(1280, 720),
            FrameBuffer::black(1280, 720),
            Toolbar::synthetic(1280),
        )
    }

    #[test]
    fn modes_follow_finger_patterns() {
        assert_eq!(Mode::from_fingers(FingerState(THUMB_INDEX)), Mode::SizeAdjust);
        assert_eq!(Mode::from_fingers(FingerState(INDEX_MIDDLE)), Mode::Select);
        assert_eq!(Mode::from_fingers(FingerState([true, true, true, true, true])), Mode::Select);
        assert_eq!(Mode::from_fingers(FingerState(INDEX_ONLY)), Mode::Draw);
        assert_eq!(Mode::from_fingers(FingerState([false; 5])), Mode::Idle);
        assert_eq!(Mode::from_fingers(FingerState([false, true, false, true, false])), Mode::Idle);
    }

    #[test]
    fn distance_maps_to_thickness() {
        assert_eq!(size_from_distance(30.0).pen, 6);
        assert_eq!(size_from_distance(200.0).pen, 25);
        assert_eq!(size_from_distance(115.0).pen, 15);
        assert_eq!(size_from_distance(500.0).pen, 25);
        assert_eq!(size_from_distance(0.0).pen, 6);
    }

    #[test]
    fn distance_maps_to_eraser_and_percent() {
        let mid = size_from_distance(115.0);
        assert_eq!((mid.eraser, mid.percent), (125, 50));
        let far = size_from_distance(1000.0);
        assert_eq!((far.eraser, far.percent), (200, 100));
    }

    #[test]
    fn interp_clamps_instead_of_extrapolating() {
        assert_eq!(interp(-10.0, [0.0, 10.0], [5.0, 7.0]), 5.0);
        assert_eq!(interp(20.0, [0.0, 10.0], [5.0, 7.0]), 7.0);
        assert_eq!(interp(5.0, [0.0, 10.0], [5.0, 7.0]), 6.0);
    }

    #[test]
    fn two_draw_frames_leave_a_segment_on_the_canvas() {
        let (mut s, mut frame, mut canvas, tb) = setup();
        s.update(&hand(INDEX_ONLY, (100, 100)), &mut frame, &mut canvas, &tb).unwrap();
        let mode = s.update(&hand(INDEX_ONLY, (200, 200)), &mut frame, &mut canvas, &tb).unwrap();

        assert_eq!(mode, Some(Mode::Draw));
        let ink = s.color.packed();
        for t in [100, 125, 150, 175, 200] {
            assert_eq!(canvas.get(t, t), Some(ink), "({t},{t})");
        }
        // Six pixels wide: just off the diagonal is inked, far off is not.
        assert_eq!(canvas.get(152, 150), Some(ink));
        assert_eq!(canvas.get(160, 140), Some(0));
        assert_eq!(s.trail, Some((200, 200)));
    }

    #[test]
    fn first_draw_frame_lays_a_dot() {
        let (mut s, mut frame, mut canvas, tb) = setup();
        s.update(&hand(INDEX_ONLY, (300, 300)), &mut frame, &mut canvas, &tb).unwrap();
        assert_eq!(canvas.get(300, 300), Some(s.color.packed()));
        assert_eq!(canvas.get(310, 300), Some(0));
    }

    #[test]
    fn eraser_overpaints_with_black() {
        let (mut s, mut frame, mut canvas, tb) = setup();
        s.update(&hand(INDEX_ONLY, (300, 400)), &mut frame, &mut canvas, &tb).unwrap();
        s.update(&hand(INDEX_ONLY, (500, 400)), &mut frame, &mut canvas, &tb).unwrap();
        let ink = Some(s.color.packed());
        assert_eq!(canvas.get(400, 400), ink);
        assert_eq!(canvas.get(400, 402), ink);

        // Pick the eraser from the toolbar, then go over the same path.
        s.update(&hand(INDEX_MIDDLE, (1100, 50)), &mut frame, &mut canvas, &tb).unwrap();
        assert!(s.color.is_eraser());
        assert_eq!(s.stroke_width(), 110);
        s.update(&hand(INDEX_ONLY, (300, 400)), &mut frame, &mut canvas, &tb).unwrap();
        s.update(&hand(INDEX_ONLY, (500, 400)), &mut frame, &mut canvas, &tb).unwrap();

        // Every inked pixel of the pen stroke is gone, not just its center line.
        assert_eq!(canvas.get(400, 400), Some(Rgb::BLACK.packed()));
        assert_eq!(canvas.get(400, 402), Some(Rgb::BLACK.packed()));
        assert!(!canvas.pixels.contains(&Rgb(0, 0, 255).packed()));
    }

    #[test]
    fn select_picks_slot_and_breaks_the_stroke() {
        let (mut s, mut frame, mut canvas, tb) = setup();
        s.update(&hand(INDEX_ONLY, (600, 600)), &mut frame, &mut canvas, &tb).unwrap();
        assert!(s.trail.is_some());

        let mode = s.update(&hand(INDEX_MIDDLE, (150, 50)), &mut frame, &mut canvas, &tb).unwrap();
        assert_eq!(mode, Some(Mode::Select));
        assert_eq!(s.slot, 0);
        assert_eq!(s.color, Rgb(120, 0, 255));
        assert_eq!(s.trail, None);
    }

    #[test]
    fn select_outside_regions_keeps_tool() {
        let (mut s, mut frame, mut canvas, tb) = setup();
        s.update(&hand(INDEX_MIDDLE, (1100, 50)), &mut frame, &mut canvas, &tb).unwrap();
        let before = s.clone();

        s.update(&hand(INDEX_MIDDLE, (50, 50)), &mut frame, &mut canvas, &tb).unwrap();
        assert_eq!(s, before);
        // Below the header nothing is picked either.
        s.update(&hand(INDEX_MIDDLE, (150, 300)), &mut frame, &mut canvas, &tb).unwrap();
        assert_eq!(s, before);
    }

    #[test]
    fn size_gesture_updates_brush_and_draws_gauge() {
        let (mut s, mut frame, mut canvas, tb) = setup();
        let lm = hand(THUMB_INDEX, (640, 400));
        let (t, i) = (lm[THUMB_TIP], lm[INDEX_TIP]);
        let expected = size_from_distance(((i.x - t.x) as f32).hypot((i.y - t.y) as f32));

        let mode = s.update(&lm, &mut frame, &mut canvas, &tb).unwrap();
        assert_eq!(mode, Some(Mode::SizeAdjust));
        assert_eq!((s.pen_thickness, s.eraser_size), (expected.pen, expected.eraser));
        // Gauge outline is on the display frame only.
        assert_eq!(frame.get(1195, 400), Some(s.color.packed()));
        assert_eq!(canvas.get(1195, 400), Some(0));
    }

    #[test]
    fn losing_the_hand_breaks_the_stroke() {
        let (mut s, mut frame, mut canvas, tb) = setup();
        s.update(&hand(INDEX_ONLY, (100, 600)), &mut frame, &mut canvas, &tb).unwrap();
        assert_eq!(s.update(&[], &mut frame, &mut canvas, &tb).unwrap(), None);
        assert_eq!(s.trail, None);

        // Next stroke starts fresh: nothing drawn between the two points.
        s.update(&hand(INDEX_ONLY, (400, 600)), &mut frame, &mut canvas, &tb).unwrap();
        assert_eq!(canvas.get(250, 600), Some(0));
    }

    #[test]
    fn idle_pose_draws_nothing() {
        let (mut s, mut frame, mut canvas, tb) = setup();
        let mode = s.update(&hand([false; 5], (500, 500)), &mut frame, &mut canvas, &tb).unwrap();
        assert_eq!(mode, Some(Mode::Idle));
        assert!(canvas.pixels.iter().all(|&p| p == 0));
    }
}
