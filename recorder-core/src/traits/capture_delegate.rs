use crate::models::error::CaptureError;
use crate::models::media_models::AudioLevels;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;

/// Event delegate for recording session notifications.
///
/// Methods are called from session worker threads, not the UI thread.
/// Implementations should marshal to the UI thread if needed.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: &CaptureState);

    /// Called once per second of the pre-recording countdown.
    fn on_countdown(&self, remaining_secs: u32);

    /// Called periodically with updated input levels and duration.
    fn on_levels_updated(&self, levels: &AudioLevels, duration_secs: f64);

    /// Called when a capture loop fails.
    fn on_error(&self, error: &CaptureError);

    /// Called when recording completes and the files are finalized.
    fn on_capture_finished(&self, result: &RecordingResult);
}
