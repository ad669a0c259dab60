// Windows + software drawing utilities.
// Visual effects provided here:
// 1) Windows that show the composited feed and the raw canvas.
// 2) Thick strokes, filled dots, and rectangles for the brush and size gauge.
// 3) A tiny 5x7 bitmap font (scalable) for the HUD and the gauge label.

use crate::error::Error;
use crate::types::{FrameBuffer, Rgb};
use minifb::{Key, Window, WindowOptions};

pub struct Drawer {
    window: Window, // the on-screen window you see
}

impl Drawer {
    /// Create a window sized to the camera feed.
    /// Visual: a new empty window appears with your chosen title.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(format!("{title}: {e}")))?;
        Ok(Self { window })
    }

    /// Push the pixels for this frame to the screen.
    /// Visual: the window immediately displays the new image.
    pub fn present(&mut self, framebuffer: &FrameBuffer) -> Result<(), Error> {
        self.window
            .update_with_buffer(&framebuffer.pixels, framebuffer.width, framebuffer.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        Ok(())
    }

    /// Returns false when the user closes the window (so we can stop the loop).
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// True while Q (or ESC) is held down.
    pub fn quit_pressed(&self) -> bool {
        self.window.is_key_down(Key::Q) || self.window.is_key_down(Key::Escape)
    }
}

/* ---------- Software drawing: pixels, strokes, shapes, tiny bitmap font ---------- */

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
#[inline]
pub fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

/// Squared distance from (px,py) to the segment a-b.
fn dist2_to_segment(px: f32, py: f32, a: (f32, f32), b: (f32, f32)) -> f32 {
    let (vx, vy) = (b.0 - a.0, b.1 - a.1);
    let len2 = vx * vx + vy * vy;
    let t = if len2 <= f32::EPSILON {
        0.0
    } else {
        (((px - a.0) * vx + (py - a.1) * vy) / len2).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.0 + t * vx, a.1 + t * vy);
    (px - cx) * (px - cx) + (py - cy) * (py - cy)
}

/// Draw a stroke of `thickness` pixels from (x0,y0) to (x1,y1) with round ends.
/// Visual: the brush line; a zero-length stroke leaves a round dot.
pub fn draw_thick_line(
    fb: &mut FrameBuffer,
    (x0, y0): (i32, i32),
    (x1, y1): (i32, i32),
    thickness: i32,
    color: Rgb,
) {
    let half = (thickness.max(1) as f32) / 2.0;
    let reach = half.ceil() as i32;
    let packed = color.packed();
    let a = (x0 as f32, y0 as f32);
    let b = (x1 as f32, y1 as f32);

    // Scan only the stroke's bounding box, clipped to the buffer.
    let min_x = (x0.min(x1) - reach).max(0);
    let max_x = (x0.max(x1) + reach).min(fb.width as i32 - 1);
    let min_y = (y0.min(y1) - reach).max(0);
    let max_y = (y0.max(y1) + reach).min(fb.height as i32 - 1);

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            if dist2_to_segment(x as f32, y as f32, a, b) <= half * half {
                put_pixel(fb, x, y, packed);
            }
        }
    }
}

/// Filled disc centered at (cx,cy). Visual: the fingertip cursor dot.
pub fn fill_circle(fb: &mut FrameBuffer, (cx, cy): (i32, i32), radius: i32, color: Rgb) {
    let packed = color.packed();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put_pixel(fb, cx + dx, cy + dy, packed);
            }
        }
    }
}

/// Solid rectangle between two corners (inclusive).
pub fn fill_rect(fb: &mut FrameBuffer, (x0, y0): (i32, i32), (x1, y1): (i32, i32), color: Rgb) {
    let packed = color.packed();
    for y in y0.min(y1)..=y0.max(y1) {
        for x in x0.min(x1)..=x0.max(x1) {
            put_pixel(fb, x, y, packed);
        }
    }
}

/// Rectangle outline with the border growing inward and outward around the edge.
pub fn draw_rect(
    fb: &mut FrameBuffer,
    (x0, y0): (i32, i32),
    (x1, y1): (i32, i32),
    thickness: i32,
    color: Rgb,
) {
    let h = thickness.max(1) / 2;
    fill_rect(fb, (x0 - h, y0 - h), (x1 + h, y0 + h), color); // top
    fill_rect(fb, (x0 - h, y1 - h), (x1 + h, y1 + h), color); // bottom
    fill_rect(fb, (x0 - h, y0 - h), (x0 + h, y1 + h), color); // left
    fill_rect(fb, (x1 - h, y0 - h), (x1 + h, y1 + h), color); // right
}

/* ---------- 5x7 bitmap font (ASCII subset for "FPS: 00" and "100 %") ---------- */

/// Return a 5x7 glyph bitmap for a limited character set.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    // Helper macro to define a glyph quickly
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch {
        // Digits 0..9
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        // Uppercase letters we need: F P S
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),

        // Punctuation: space, colon, percent
        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '%' => g!(0b11001,0b11010,0b00010,0b00100,0b01000,0b01011,0b10011),

        _ => None,
    }
}

/// Draw a single 5x7 character at (x,y), each font pixel a `scale`x`scale` block.
/// Visual: a glyph with a black drop shadow for contrast against the video.
fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, scale: i32, color: u32) {
    let Some(rows) = glyph5x7(ch) else { return };
    let s = scale.max(1);

    // Shadow pass first, then the glyph itself on top.
    for (offset, col) in [(s.max(1), 0x0000_0000), (0, color)] {
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..5 {
                if (rowbits & (1 << (4 - rx))) == 0 {
                    continue;
                }
                let px = x + rx * s + offset;
                let py = y + ry as i32 * s + offset;
                for by in 0..s {
                    for bx in 0..s {
                        put_pixel(fb, px + bx, py + by, col);
                    }
                }
            }
        }
    }
}

/// Draw a text string using 5x7 glyphs; (x,y) is the top-left corner.
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, scale: i32, color: u32) {
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch, scale, color);
        x += 6 * scale.max(1); // 5 pixels glyph width + 1 pixel spacing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb(255, 0, 0);

    #[test]
    fn thick_line_covers_endpoints_and_middle() {
        let mut fb = FrameBuffer::black(64, 64);
        draw_thick_line(&mut fb, (10, 10), (50, 50), 6, RED);
        for (x, y) in [(10, 10), (30, 30), (50, 50), (32, 30)] {
            assert_eq!(fb.get(x, y), Some(RED.packed()), "({x},{y})");
        }
        assert_eq!(fb.get(50, 10), Some(0));
    }

    #[test]
    fn zero_length_line_is_a_dot() {
        let mut fb = FrameBuffer::black(20, 20);
        draw_thick_line(&mut fb, (10, 10), (10, 10), 6, RED);
        assert_eq!(fb.get(10, 10), Some(RED.packed()));
        assert_eq!(fb.get(13, 10), Some(RED.packed()));
        assert_eq!(fb.get(14, 10), Some(0));
    }

    #[test]
    fn shapes_clip_at_the_edges() {
        let mut fb = FrameBuffer::black(8, 8);
        fill_circle(&mut fb, (0, 0), 15, RED);
        draw_thick_line(&mut fb, (-20, -20), (40, 40), 3, RED);
        draw_rect(&mut fb, (-5, -5), (100, 100), 3, RED);
        assert!(fb.pixels.iter().all(|&p| p == RED.packed()));
    }

    #[test]
    fn rect_outline_leaves_interior() {
        let mut fb = FrameBuffer::black(40, 40);
        draw_rect(&mut fb, (5, 5), (30, 30), 3, RED);
        assert_eq!(fb.get(5, 20), Some(RED.packed()));
        assert_eq!(fb.get(6, 20), Some(RED.packed()));
        assert_eq!(fb.get(18, 18), Some(0));
    }

    #[test]
    fn text_renders_known_glyphs_only() {
        let mut fb = FrameBuffer::black(60, 20);
        draw_text_5x7(&mut fb, 1, 1, "5 %", 1, 0x00FF_FFFF);
        assert!(fb.pixels.iter().any(|&p| p == 0x00FF_FFFF));

        let mut blank = FrameBuffer::black(60, 20);
        draw_text_5x7(&mut blank, 1, 1, "zz", 2, 0x00FF_FFFF);
        assert!(blank.pixels.iter().all(|&p| p == 0));
    }
}
