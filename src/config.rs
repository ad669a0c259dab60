// Command-line configuration.

use std::path::PathBuf;

use clap::Parser;

use crate::hand::DEFAULT_MODEL;
use crate::palm::DEFAULT_PALM_MODEL;

#[derive(Debug, Parser)]
#[command(author, version, about = "Paint in the air with your index finger")]
pub struct Config {
    /// Camera device index
    #[arg(long, default_value_t = 0)]
    pub camera: u32,

    /// Requested capture width
    #[arg(long, default_value_t = 1280)]
    pub width: u32,

    /// Requested capture height
    #[arg(long, default_value_t = 720)]
    pub height: u32,

    /// Folder of toolbar header images, one per tool, loaded in file-name order.
    /// Plain swatches are drawn instead when the folder doesn't exist.
    #[arg(long, default_value = "Header")]
    pub headers: PathBuf,

    /// ONNX handpose model
    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: PathBuf,

    /// ONNX palm detection model, run first to locate the hand
    #[arg(long, default_value = DEFAULT_PALM_MODEL)]
    pub palm_model: PathBuf,

    /// Palms below this score are ignored
    #[arg(long, default_value_t = 0.85)]
    pub min_detection_confidence: f32,

    /// Landmark sets below this score count as no hand
    #[arg(long, default_value_t = 0.5)]
    pub min_tracking_confidence: f32,

    /// Pause after each frame, in milliseconds
    #[arg(long, default_value_t = 10)]
    pub frame_delay_ms: u64,

    /// Show the camera unflipped
    #[arg(long)]
    pub no_mirror: bool,

    /// Don't draw the hand skeleton on the feed
    #[arg(long)]
    pub no_skeleton: bool,
}
