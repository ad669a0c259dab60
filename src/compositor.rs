// Merges the persistent canvas and the toolbar header into the live frame.
// Visual: strokes sit opaquely on top of the video; the header covers the top rows.

use crate::error::Error;
use crate::toolbar::HEADER_HEIGHT;
use crate::types::FrameBuffer;

/// Canvas pixels brighter than this (greyscale) count as "drawn".
pub const INK_THRESHOLD: u8 = 50;

/// Luma of a 0x00RRGGBB pixel (0.299 R + 0.587 G + 0.114 B, 14-bit fixed point).
#[inline]
pub fn grey(px: u32) -> u8 {
    let r = (px >> 16) & 0xFF;
    let g = (px >> 8) & 0xFF;
    let b = px & 0xFF;
    ((r * 4899 + g * 9617 + b * 1868 + (1 << 13)) >> 14) as u8
}

/// Inverted ink mask for one canvas pixel: 0 where drawn, all-ones where blank.
#[inline]
fn blank_mask(canvas_px: u32) -> u32 {
    if grey(canvas_px) > INK_THRESHOLD { 0 } else { 0x00FF_FFFF }
}

/// frame = (frame AND mask) OR canvas, pixel by pixel.
/// Visual: wherever the canvas has ink, the live feed is replaced by the ink.
pub fn composite(frame: &mut FrameBuffer, canvas: &FrameBuffer) -> Result<(), Error> {
    if !frame.same_size(canvas) {
        return Err(Error::Composite(format!(
            "frame is {}x{} but canvas is {}x{}",
            frame.width, frame.height, canvas.width, canvas.height
        )));
    }
    for (live, &ink) in frame.pixels.iter_mut().zip(&canvas.pixels) {
        *live = (*live & blank_mask(ink)) | ink;
    }
    Ok(())
}

/// Overwrite the top rows of the frame with the selected header image.
pub fn stamp_header(frame: &mut FrameBuffer, header: &FrameBuffer) -> Result<(), Error> {
    if header.width != frame.width || header.height != HEADER_HEIGHT || frame.height < HEADER_HEIGHT {
        return Err(Error::Composite(format!(
            "header is {}x{}, frame is {}x{} (need {}x{} strip)",
            header.width, header.height, frame.width, frame.height, frame.width, HEADER_HEIGHT
        )));
    }
    frame.pixels[..header.pixels.len()].copy_from_slice(&header.pixels);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rgb;

    #[test]
    fn grey_matches_standard_luma() {
        assert_eq!(grey(Rgb(0, 0, 0).packed()), 0);
        assert_eq!(grey(Rgb(255, 255, 255).packed()), 255);
        assert_eq!(grey(Rgb(255, 0, 0).packed()), 76);
        assert_eq!(grey(Rgb(0, 0, 255).packed()), 29);
    }

    #[test]
    fn ink_replaces_live_and_blank_keeps_it() {
        let live = Rgb(10, 200, 30).packed();
        let mut frame = FrameBuffer { width: 2, height: 1, pixels: vec![live, live] };
        let red = Rgb(255, 0, 0).packed();
        let canvas = FrameBuffer { width: 2, height: 1, pixels: vec![red, 0] };

        composite(&mut frame, &canvas).unwrap();
        assert_eq!(frame.pixels, vec![red, live]);
    }

    #[test]
    fn dark_ink_is_ored_over_live() {
        // Blue is below the threshold, so the live pixel is kept and OR-ed.
        let live = Rgb(10, 20, 30).packed();
        let blue = Rgb(0, 0, 255).packed();
        let mut frame = FrameBuffer { width: 1, height: 1, pixels: vec![live] };
        let canvas = FrameBuffer { width: 1, height: 1, pixels: vec![blue] };

        composite(&mut frame, &canvas).unwrap();
        assert_eq!(frame.pixels, vec![live | blue]);
    }

    #[test]
    fn size_mismatch_is_an_error() {
        let mut frame = FrameBuffer::black(4, 4);
        let canvas = FrameBuffer::black(4, 3);
        assert!(matches!(composite(&mut frame, &canvas), Err(Error::Composite(_))));
    }

    #[test]
    fn header_covers_only_top_rows() {
        let live = Rgb(1, 2, 3).packed();
        let mut frame = FrameBuffer { width: 8, height: 200, pixels: vec![live; 8 * 200] };
        let tint = Rgb(9, 9, 9).packed();
        let header = FrameBuffer { width: 8, height: HEADER_HEIGHT, pixels: vec![tint; 8 * HEADER_HEIGHT] };

        stamp_header(&mut frame, &header).unwrap();
        assert_eq!(frame.get(7, HEADER_HEIGHT - 1), Some(tint));
        assert_eq!(frame.get(0, HEADER_HEIGHT), Some(live));
    }

    #[test]
    fn header_width_must_match_frame() {
        let mut frame = FrameBuffer::black(8, 200);
        let header = FrameBuffer::black(7, HEADER_HEIGHT);
        assert!(stamp_header(&mut frame, &header).is_err());
    }
}
