// What you SEE:
// • "Image": the mirrored live camera with your strokes painted over it and
//   the toolbar along the top.
// • "Canvas": the strokes alone on black.
// • Index finger up: draw. Index + middle up: point at the toolbar to pick a
//   color or the eraser. Thumb + index: pinch wider/narrower to size the brush.
// • Q or ESC quits; closing either window quits too.

mod app;
mod camera;
mod compositor;
mod config;
mod draw;
mod error;
mod gesture;
mod hand;
mod painter;
mod palm;
mod skeleton;
mod toolbar;
mod types;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;

use app::{Exit, Painter, run};
use camera::CameraCapture;
use config::Config;
use draw::{Drawer, draw_text_5x7};
use error::Error;
use hand::OrtHandpose;
use toolbar::{Toolbar, load_headers};

fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cfg = Config::parse();

    /* --- Ctrl-C leaves the loop like the quit key does --- */
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst))
            .map_err(|e| Error::Signal(format!("Install Ctrl-C handler: {e}")))?;
    }

    /* --- Camera, models, toolbar, windows --- */
    let mut cam = CameraCapture::new(cfg.camera, cfg.width, cfg.height)
        .inspect_err(|e| log::error!("could not open video capture: {e}"))?;
    let (w, h) = cam.resolution();
    let (w, h) = (w as usize, h as usize);
    log::info!("camera {} streaming at {w}x{h}", cfg.camera);

    let mut hands = OrtHandpose::new(
        &cfg.model,
        &cfg.palm_model,
        cfg.min_detection_confidence,
        cfg.min_tracking_confidence,
    )
    .inspect_err(|e| log::error!("could not load hand models: {e}"))?;

    let toolbar = build_toolbar(&cfg, w)?;

    let mut image_win = Drawer::new("Image", w, h)?;
    let mut canvas_win = Drawer::new("Canvas", w, h)?;

    /* --- Session state: canvas + tool settings, kept across frames --- */
    let mut painter = Painter::new(toolbar, w, h, !cfg.no_mirror, !cfg.no_skeleton);
    let delay = Duration::from_millis(cfg.frame_delay_ms);

    /* --- FPS --- */
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut hud_fps_text = String::from("FPS: 0");

    /* ------------------------------ Main loop ------------------------------ */
    let exit = run(&mut cam, &mut hands, &mut painter, &interrupted, |frame, canvas| {
        draw_text_5x7(frame, 10, h as i32 - 40, &hud_fps_text, 3, 0x00_FF_00_FF);

        // Show both windows, then wait a moment (also our key-poll interval).
        image_win.present(frame)?;
        canvas_win.present(canvas)?;
        thread::sleep(delay);
        if !image_win.is_open() || !canvas_win.is_open() {
            log::info!("window closed");
            return Ok(false);
        }
        if image_win.quit_pressed() || canvas_win.quit_pressed() {
            log::info!("quit requested");
            return Ok(false);
        }

        frames_this_second += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let fps = frames_this_second as f32 / now.duration_since(last_fps_time).as_secs_f32();
            log::debug!("FPS: {fps:.1}");
            hud_fps_text = format!("FPS: {}", fps as u32);
            frames_this_second = 0;
            last_fps_time = now;
        }
        Ok(true)
    })?;
    if let Exit::CaptureFailed(_) | Exit::CompositeFailed(_) = exit {
        log::warn!("session ended early: {exit:?}");
    }

    // Dropping `cam` stops the stream; the windows close with their Drawers.
    Ok(())
}

/// Header images from the configured folder, or drawn swatches if there is none.
fn build_toolbar(cfg: &Config, width: usize) -> Result<Toolbar, Error> {
    if !cfg.headers.is_dir() {
        log::warn!(
            "header folder {} not found, using built-in toolbar",
            cfg.headers.display()
        );
        return Ok(Toolbar::synthetic(width));
    }
    let toolbar = load_headers(&cfg.headers, width).and_then(Toolbar::new);
    match &toolbar {
        Ok(tb) => log::info!("loaded {} header images from {}", tb.len(), cfg.headers.display()),
        Err(e) => log::error!("{e}"),
    }
    toolbar
}
