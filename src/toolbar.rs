// The toolbar strip along the top of the screen.
// Visual: a 125-pixel-high header showing the tools; pointing at a tool with
// two fingers picks its color (the last tool is the eraser).
//
// Each slot ties together three things that must stay in sync: the screen
// region you point at, the stroke color it selects, and the header image shown
// while it is selected.

use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};

use crate::draw::{draw_rect, fill_rect};
use crate::error::Error;
use crate::types::{FrameBuffer, Rgb};

/// Height of the header strip in pixels.
pub const HEADER_HEIGHT: usize = 125;

/// Screen x-range (exclusive on both ends) that selects a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub x_min: i32,
    pub x_max: i32,
}

impl Region {
    pub fn contains(&self, x: i32) -> bool {
        self.x_min < x && x < self.x_max
    }
}

/// Region and color per slot, in header image order.
pub const SLOTS: [(Region, Rgb); 6] = [
    (Region { x_min: 100, x_max: 240 }, Rgb(120, 0, 255)),  // purple
    (Region { x_min: 280, x_max: 410 }, Rgb(255, 0, 0)),    // red
    (Region { x_min: 430, x_max: 590 }, Rgb(0, 0, 255)),    // blue
    (Region { x_min: 630, x_max: 770 }, Rgb(255, 255, 0)),  // yellow
    (Region { x_min: 790, x_max: 920 }, Rgb(0, 255, 0)),    // green
    (Region { x_min: 1050, x_max: 1180 }, Rgb::BLACK),      // eraser
];

#[derive(Clone, Debug)]
pub struct ToolSlot {
    pub region: Region,
    pub color: Rgb,
    pub header: FrameBuffer,
}

#[derive(Clone, Debug)]
pub struct Toolbar {
    slots: Vec<ToolSlot>,
}

impl Toolbar {
    /// Pair header images with the fixed slot table. The counts must match.
    pub fn new(headers: Vec<FrameBuffer>) -> Result<Self, Error> {
        if headers.len() != SLOTS.len() {
            return Err(Error::Toolbar(format!(
                "expected {} header images, found {}",
                SLOTS.len(),
                headers.len()
            )));
        }
        let slots = SLOTS
            .iter()
            .zip(headers)
            .map(|(&(region, color), header)| ToolSlot { region, color, header })
            .collect();
        Ok(Self { slots })
    }

    /// Headers drawn in software, for running without a header image folder.
    /// Visual: a dark strip with one colored swatch per tool; the selected one is framed.
    pub fn synthetic(width: usize) -> Self {
        let slots = SLOTS
            .iter()
            .enumerate()
            .map(|(i, &(region, color))| ToolSlot { region, color, header: render_header(width, i) })
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, index: usize) -> Option<&ToolSlot> {
        self.slots.get(index)
    }

    /// Which slot the pointer at (x,y) is over, if any.
    pub fn hit_test(&self, x: i32, y: i32) -> Option<usize> {
        if y >= HEADER_HEIGHT as i32 {
            return None;
        }
        self.slots.iter().position(|s| s.region.contains(x))
    }
}

fn render_header(width: usize, selected: usize) -> FrameBuffer {
    let mut fb = FrameBuffer {
        width,
        height: HEADER_HEIGHT,
        pixels: vec![Rgb(40, 40, 40).packed(); width * HEADER_HEIGHT],
    };
    for (i, (region, color)) in SLOTS.iter().enumerate() {
        let (x0, x1) = (region.x_min + 4, region.x_max - 4);
        fill_rect(&mut fb, (x0, 25), (x1, 100), *color);
        if color.is_eraser() {
            draw_rect(&mut fb, (x0, 25), (x1, 100), 1, Rgb(160, 160, 160));
        }
        if i == selected {
            draw_rect(&mut fb, (x0 - 6, 19), (x1 + 6, 106), 3, Rgb(255, 255, 255));
        }
    }
    fb
}

/// Image files in `dir`, sorted by file name.
fn header_paths(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let entries = fs::read_dir(dir)
        .map_err(|e| Error::Header(format!("Read {}: {e}", dir.display())))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| Error::Header(format!("Read {}: {e}", dir.display())))?
            .path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Load every header image in `dir` (file-name order), scaled to `width` x 125.
pub fn load_headers(dir: &Path, width: usize) -> Result<Vec<FrameBuffer>, Error> {
    header_paths(dir)?
        .iter()
        .map(|path| {
            let img = image::open(path)
                .map_err(|e| Error::Header(format!("Decode {}: {e}", path.display())))?
                .to_rgb8();
            let img = if img.width() as usize != width || img.height() as usize != HEADER_HEIGHT {
                log::warn!(
                    "header {} is {}x{}, scaling to {}x{}",
                    path.display(),
                    img.width(),
                    img.height(),
                    width,
                    HEADER_HEIGHT
                );
                imageops::resize(&img, width as u32, HEADER_HEIGHT as u32, FilterType::Triangle)
            } else {
                img
            };
            let pixels = img
                .pixels()
                .map(|p| Rgb(p[0], p[1], p[2]).packed())
                .collect();
            Ok(FrameBuffer { width, height: HEADER_HEIGHT, pixels })
        })
        .collect()
}
