use crate::models::config::RecorderSettings;
use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;

/// Main recording session interface, as driven by the control panel.
pub trait CaptureSession: Send {
    /// Current session state.
    fn state(&self) -> CaptureState;

    /// Apply settings. Only allowed while idle.
    fn configure(&mut self, settings: RecorderSettings) -> Result<(), CaptureError>;

    /// Run the countdown and start capture. Transitions: idle → counting_down → recording.
    fn start_capture(&mut self) -> Result<(), CaptureError>;

    /// Pause capture. Transitions: recording → paused.
    fn pause_capture(&mut self) -> Result<(), CaptureError>;

    /// Resume capture. Transitions: paused → recording.
    fn resume_capture(&mut self) -> Result<(), CaptureError>;

    /// Stop capture and finalize the output files.
    /// Transitions: recording/paused → stopping → completed/failed → idle.
    fn stop_capture(&mut self) -> Result<RecordingResult, CaptureError>;
}
