use std::path::Path;

use crate::models::config::RecorderSettings;
use crate::models::error::CaptureError;
use crate::models::media_models::FrameGeometry;

/// A video container writer fed one raw frame at a time.
///
/// Frames are packed BGR24 of exactly `geometry.bgr_frame_len()` bytes.
pub trait VideoEncoder: Send {
    /// Create the output file. Called once, with the geometry of the first frame.
    fn open(&mut self, path: &Path, geometry: FrameGeometry, settings: &RecorderSettings) -> Result<(), CaptureError>;

    fn write_frame(&mut self, bgr: &[u8]) -> Result<(), CaptureError>;

    /// Finalize the container. Safe to call when `open` never succeeded.
    fn finish(&mut self) -> Result<(), CaptureError>;

    fn frames_written(&self) -> u64;
}
