//! Display and audio input enumeration.
//!
//! Displays come from `xcap`, input devices from the default `cpal` host.
//! Devices are identified by name, which is what `cpal` exposes on every
//! platform.

use cpal::traits::{DeviceTrait, HostTrait};

use screen_recorder_core::models::error::CaptureError;
use screen_recorder_core::models::media_models::{AudioSource, DisplayInfo};

use crate::screen_capture;

pub struct DeviceEnumerator {
    host: cpal::Host,
}

impl DeviceEnumerator {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    /// Connected monitors, primary first.
    pub fn list_displays(&self) -> Result<Vec<DisplayInfo>, CaptureError> {
        let mut displays = screen_capture::all_monitors()?
            .iter()
            .map(screen_capture::monitor_info)
            .collect::<Result<Vec<_>, _>>()?;
        displays.sort_by_key(|d| !d.is_primary);
        Ok(displays)
    }

    /// Audio input devices, default first.
    pub fn list_input_devices(&self) -> Result<Vec<AudioSource>, CaptureError> {
        let default_name = self.default_input_device_name();
        let devices = self
            .host
            .input_devices()
            .map_err(|e| CaptureError::Unknown(format!("failed to list input devices: {}", e)))?;

        let mut sources: Vec<AudioSource> = devices
            .filter_map(|device| device.name().ok())
            .map(|name| AudioSource {
                id: name.clone(),
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
            })
            .collect();
        sources.sort_by_key(|s| !s.is_default);
        Ok(sources)
    }

    pub fn default_input_device_name(&self) -> Option<String> {
        self.host.default_input_device().and_then(|d| d.name().ok())
    }

    /// The input device called `name`, or the default input for `None`.
    pub fn find_input_device(&self, name: Option<&str>) -> Result<cpal::Device, CaptureError> {
        match name {
            None => self.host.default_input_device().ok_or(CaptureError::DeviceNotAvailable),
            Some(wanted) => {
                let mut devices = self
                    .host
                    .input_devices()
                    .map_err(|e| CaptureError::Unknown(format!("failed to list input devices: {}", e)))?;
                devices
                    .find(|d| d.name().map(|n| n == wanted).unwrap_or(false))
                    .ok_or(CaptureError::DeviceNotAvailable)
            }
        }
    }
}

impl Default for DeviceEnumerator {
    fn default() -> Self {
        Self::new()
    }
}
