use crate::models::error::CaptureError;
use crate::models::media_models::{DisplayInfo, VideoFrame};

/// A blocking screenshot facility.
///
/// Each call grabs the whole selected display as RGBA.
pub trait FrameSource: Send {
    fn is_available(&self) -> bool;

    fn display_info(&self) -> DisplayInfo;

    fn capture_frame(&mut self) -> Result<VideoFrame, CaptureError>;
}
