// One error type for the whole painter.
// Every variant states *where* things went wrong.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Window init error: {0}")]
    WindowInit(String), // Creating a window failed
    #[error("Window update error: {0}")]
    WindowUpdate(String), // Pushing a buffer to a window failed
    #[error("Camera init error: {0}")]
    CameraInit(String), // Opening/starting the camera failed
    #[error("Camera frame error: {0}")]
    CameraFrame(String), // Grabbing/decoding a frame failed
    #[error("Model error: {0}")]
    Model(String), // Loading the hand landmark model failed
    #[error("Inference error: {0}")]
    Inference(String), // Running the model on one frame failed
    #[error("Header image error: {0}")]
    Header(String), // Reading/decoding toolbar images failed
    #[error("Toolbar error: {0}")]
    Toolbar(String), // Header images don't line up with the tool slots
    #[error("Composite error: {0}")]
    Composite(String), // Canvas/frame/header buffers don't line up
    #[error("Signal handler error: {0}")]
    Signal(String), // Installing the Ctrl-C handler failed
    #[error("missing landmark {index}: hand has only {len} points")]
    MissingLandmark { index: usize, len: usize },
}
