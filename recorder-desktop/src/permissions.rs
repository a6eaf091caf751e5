//! Capture permission checks.
//!
//! Neither screen capture nor microphone access can be queried portably, so
//! both are checked by trying the real operation once: macOS raises its
//! consent prompt on that first access, Linux and Windows simply succeed or
//! fail.

use cpal::traits::DeviceTrait;

use screen_recorder_core::models::error::CaptureError;

use crate::device_enumerator::DeviceEnumerator;
use crate::screen_capture;

/// Outcome of checking one capture permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
    /// No device to check.
    NoDevice,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Grab one screenshot of the primary monitor.
pub fn check_screen_capture_permission() -> PermissionStatus {
    let monitor = match screen_capture::find_monitor(None) {
        Ok(monitor) => monitor,
        Err(_) => return PermissionStatus::NoDevice,
    };
    match monitor.capture_image() {
        Ok(image) if image.width() > 0 && image.height() > 0 => PermissionStatus::Granted,
        Ok(_) => PermissionStatus::Denied,
        Err(e) => {
            log::warn!("Screen capture check failed: {}", e);
            PermissionStatus::Denied
        }
    }
}

/// Open the configuration of the selected (or default) input device.
pub fn check_microphone_permission(device_name: Option<&str>) -> PermissionStatus {
    let device = match DeviceEnumerator::new().find_input_device(device_name) {
        Ok(device) => device,
        Err(_) => return PermissionStatus::NoDevice,
    };
    match device.default_input_config() {
        Ok(_) => PermissionStatus::Granted,
        Err(e) => {
            log::warn!("Microphone check failed: {}", e);
            PermissionStatus::Denied
        }
    }
}

/// Fail with `PermissionDenied` when a device exists but cannot be used.
pub fn require(status: PermissionStatus) -> Result<(), CaptureError> {
    match status {
        PermissionStatus::Granted => Ok(()),
        PermissionStatus::Denied => Err(CaptureError::PermissionDenied),
        PermissionStatus::NoDevice => Err(CaptureError::DeviceNotAvailable),
    }
}

/// Succeed if any checked capture is usable; otherwise report the first
/// failure. An empty slice means nothing was requested.
pub fn require_any(statuses: &[PermissionStatus]) -> Result<(), CaptureError> {
    if statuses.is_empty() || statuses.iter().any(PermissionStatus::is_granted) {
        return Ok(());
    }
    statuses.iter().try_for_each(|status| require(*status))
}
