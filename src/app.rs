// The per-frame pipeline and the loop around it, with the camera, the model
// and the windows passed in so the whole thing runs without hardware.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::compositor::{composite, stamp_header};
use crate::error::Error;
use crate::hand::LandmarkProvider;
use crate::painter::Session;
use crate::skeleton::draw_skeleton;
use crate::toolbar::Toolbar;
use crate::types::FrameBuffer;

/// Where live frames come from.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<FrameBuffer, Error>;
}

/// Why the loop stopped.
#[derive(Debug)]
pub enum Exit {
    Quit,
    Interrupted,
    CaptureFailed(Error),
    CompositeFailed(Error),
}

/// Everything that survives from one frame to the next.
pub struct Painter {
    pub session: Session,
    canvas: FrameBuffer,
    toolbar: Toolbar,
    mirror: bool,
    skeleton: bool,
}

impl Painter {
    pub fn new(toolbar: Toolbar, width: usize, height: usize, mirror: bool, skeleton: bool) -> Self {
        Self {
            session: Session::default(),
            canvas: FrameBuffer::black(width, height),
            toolbar,
            mirror,
            skeleton,
        }
    }

    /// Strokes alone on black.
    pub fn canvas(&self) -> &FrameBuffer {
        &self.canvas
    }

    /// One frame: mirror, find the hand, apply the gesture, then merge the
    /// canvas and the current tool's header over the feed.
    /// Only a merge failure is an error; a failed detection is "no hand".
    pub fn tick(
        &mut self,
        mut frame: FrameBuffer,
        hands: &mut impl LandmarkProvider,
    ) -> Result<FrameBuffer, Error> {
        if self.mirror {
            frame.mirror_horizontal();
        }

        let landmarks = hands.detect(&frame).unwrap_or_else(|e| {
            log::warn!("{e}");
            Vec::new()
        });
        if self.skeleton {
            draw_skeleton(&mut frame, &landmarks);
        }

        if let Err(e) = self.session.update(&landmarks, &mut frame, &mut self.canvas, &self.toolbar) {
            log::warn!("skipping gesture this frame: {e}");
        }

        composite(&mut frame, &self.canvas)?;
        let header = self
            .toolbar
            .slot(self.session.slot)
            .map(|slot| &slot.header)
            .ok_or_else(|| Error::Composite(format!("no header for slot {}", self.session.slot)))?;
        stamp_header(&mut frame, header)?;
        Ok(frame)
    }
}

/// Drive `painter` until something ends the session.
///
/// `show` gets the composited frame and the canvas each iteration and
/// returns whether to keep going. Its errors (e.g. a window that can't be
/// drawn to) end the loop as errors; everything else ends it with an `Exit`.
pub fn run<S, P, F>(
    source: &mut S,
    hands: &mut P,
    painter: &mut Painter,
    interrupted: &AtomicBool,
    mut show: F,
) -> Result<Exit, Error>
where
    S: FrameSource,
    P: LandmarkProvider,
    F: FnMut(&mut FrameBuffer, &FrameBuffer) -> Result<bool, Error>,
{
    loop {
        if interrupted.load(Ordering::SeqCst) {
            log::info!("interrupted");
            return Ok(Exit::Interrupted);
        }

        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("failed to read frame from camera, exiting: {e}");
                return Ok(Exit::CaptureFailed(e));
            }
        };

        let mut frame = match painter.tick(frame, hands) {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("error during image processing: {e}");
                return Ok(Exit::CompositeFailed(e));
            }
        };

        if !show(&mut frame, painter.canvas())? {
            return Ok(Exit::Quit);
        }
    }
}
