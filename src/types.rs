// Core types shared by the frame loop, gestures, and the compositor.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// An all-black buffer. Visual: this is what a fresh canvas looks like.
    pub fn black(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    /// Pixel at (x,y), or None when outside the buffer.
    #[cfg(test)]
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[y * self.width + x])
    }

    /// Flip left/right in place so the feed behaves like a mirror.
    pub fn mirror_horizontal(&mut self) {
        for row in self.pixels.chunks_exact_mut(self.width.max(1)) {
            row.reverse();
        }
    }

    pub fn same_size(&self, other: &FrameBuffer) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// An RGB color. Packs into the 0x00RRGGBB layout used by `FrameBuffer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const MAGENTA: Rgb = Rgb(255, 0, 255);

    #[inline]
    pub fn packed(self) -> u32 {
        ((self.0 as u32) << 16) | ((self.1 as u32) << 8) | self.2 as u32
    }

    #[inline]
    pub fn unpack(px: u32) -> Self {
        Rgb(((px >> 16) & 0xFF) as u8, ((px >> 8) & 0xFF) as u8, (px & 0xFF) as u8)
    }

    /// Black doubles as the eraser: it paints over strokes on the canvas.
    pub fn is_eraser(self) -> bool {
        self == Rgb::BLACK
    }
}

/// One hand keypoint in frame pixels. `id` is the anatomical index (0..=20).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Landmark {
    pub id: usize,
    pub x: i32,
    pub y: i32,
}

impl Landmark {
    pub fn new(id: usize, x: i32, y: i32) -> Self {
        Self { id, x, y }
    }

    pub fn point(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

/// Which fingers are extended: thumb, index, middle, ring, pinky.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FingerState(pub [bool; 5]);

impl FingerState {
    pub fn thumb(&self) -> bool { self.0[0] }
    pub fn index(&self) -> bool { self.0[1] }
    pub fn middle(&self) -> bool { self.0[2] }
    pub fn ring(&self) -> bool { self.0[3] }
    pub fn pinky(&self) -> bool { self.0[4] }

    /// Middle, ring and pinky all folded.
    pub fn rest_down(&self) -> bool {
        !self.middle() && !self.ring() && !self.pinky()
    }
}
