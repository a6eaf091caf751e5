//! Screenshot source backed by `xcap`.
//!
//! Grabs the whole selected monitor as RGBA on every call. The monitor is
//! looked up by id on each grab, so the source holds no platform handles
//! and can move into the video thread.

use xcap::Monitor;

use screen_recorder_core::models::error::CaptureError;
use screen_recorder_core::models::media_models::{DisplayInfo, VideoFrame};
use screen_recorder_core::traits::frame_source::FrameSource;

/// Screen capture of one monitor.
pub struct XcapFrameSource {
    display_id: Option<u32>,
    display: Option<DisplayInfo>,
}

impl XcapFrameSource {
    /// Capture the monitor with `display_id`, or the primary one for `None`.
    ///
    /// A monitor that cannot be found leaves the source unavailable.
    pub fn new(display_id: Option<u32>) -> Self {
        let display = find_monitor(display_id).and_then(|m| monitor_info(&m));
        match &display {
            Ok(d) => log::info!("Screen capture on display {} ({}, {}x{})", d.id, d.name, d.width, d.height),
            Err(e) => log::warn!("No display to capture: {}", e),
        }
        Self {
            display_id,
            display: display.ok(),
        }
    }

    fn target_id(&self) -> Option<u32> {
        self.display.as_ref().map(|d| d.id).or(self.display_id)
    }
}

impl FrameSource for XcapFrameSource {
    fn is_available(&self) -> bool {
        find_monitor(self.target_id()).is_ok()
    }

    fn display_info(&self) -> DisplayInfo {
        self.display.clone().unwrap_or_else(|| DisplayInfo {
            id: self.display_id.unwrap_or(0),
            name: "Unavailable".into(),
            width: 0,
            height: 0,
            is_primary: false,
        })
    }

    fn capture_frame(&mut self) -> Result<VideoFrame, CaptureError> {
        let monitor = find_monitor(self.target_id())?;
        let image = monitor.capture_image().map_err(|e| capture_error("screenshot failed", e))?;
        let (width, height) = (image.width(), image.height());
        Ok(VideoFrame::new(image.into_raw(), width, height))
    }
}

/// Every connected monitor.
pub fn all_monitors() -> Result<Vec<Monitor>, CaptureError> {
    Monitor::all().map_err(|e| capture_error("failed to list monitors", e))
}

/// The monitor with `display_id`; for `None` the primary monitor, or the
/// first one if none is flagged primary.
pub fn find_monitor(display_id: Option<u32>) -> Result<Monitor, CaptureError> {
    let monitors = all_monitors()?;
    let found = match display_id {
        Some(id) => monitors.into_iter().find(|m| m.id().ok() == Some(id)),
        None => {
            let primary = monitors.iter().position(|m| m.is_primary().unwrap_or(false));
            let index = primary.unwrap_or(0);
            monitors.into_iter().nth(index)
        }
    };
    found.ok_or(CaptureError::DeviceNotAvailable)
}

pub fn monitor_info(monitor: &Monitor) -> Result<DisplayInfo, CaptureError> {
    Ok(DisplayInfo {
        id: monitor.id().map_err(|e| capture_error("monitor id", e))?,
        name: monitor.name().unwrap_or_else(|_| "Unknown Display".into()),
        width: monitor.width().map_err(|e| capture_error("monitor width", e))?,
        height: monitor.height().map_err(|e| capture_error("monitor height", e))?,
        is_primary: monitor.is_primary().unwrap_or(false),
    })
}

fn capture_error(context: &str, err: impl std::fmt::Display) -> CaptureError {
    CaptureError::CaptureFailed(format!("{}: {}", context, err))
}
