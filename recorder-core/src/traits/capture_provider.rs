use std::sync::Arc;

use crate::models::error::CaptureError;
use crate::models::media_models::AudioSource;

/// Callback invoked when an audio buffer is available.
///
/// Parameters:
/// - `samples`: Interleaved f32 samples.
/// - `sample_rate`: The actual sample rate of the delivered audio.
/// - `channels`: Number of interleaved channels.
pub type AudioBufferCallback = Arc<dyn Fn(&[f32], u32, u16) + Send + Sync + 'static>;

/// Interface for platform-specific audio input sources.
///
/// Implemented by `CpalAudioProvider` in the desktop crate.
pub trait AudioProvider: Send {
    /// Whether this input source is currently available.
    fn is_available(&self) -> bool;

    /// Start sampling, delivering buffers via `callback`.
    ///
    /// The callback fires on the provider's own audio thread, keep it short.
    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), CaptureError>;

    /// Stop sampling and release the device.
    fn stop(&mut self) -> Result<(), CaptureError>;

    /// Information about the device backing this provider.
    fn device_info(&self) -> AudioSource;
}
