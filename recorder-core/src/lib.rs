//! # screen-recorder-core
//!
//! Platform-agnostic screen and audio recording core.
//!
//! Provides the capture-control state holder, the video and audio capture
//! loops, color and sample conversion, WAV output, and session orchestration.
//! Desktop backends (screenshots, audio input, the video encoder) implement
//! the `FrameSource`, `AudioProvider` and `VideoEncoder` traits and plug into
//! the generic `RecordingSession`.
//!
//! ## Architecture
//!
//! ```text
//! screen-recorder-core (this crate)
//! ├── traits/       ← FrameSource, AudioProvider, VideoEncoder, CaptureSession, CaptureDelegate, Clock
//! ├── models/       ← CaptureError, CaptureState, RecorderSettings, Resolution, VideoFrame, etc.
//! ├── processing/   ← RGBA → BGR24, FramePacer, SampleBuffer, SampleConverter, WAV header
//! ├── session/      ← CaptureControl, video/audio loops, countdown, RecordingSession
//! └── storage/      ← WavFileWriter, metadata sidecar, settings file, output naming, checksums
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::{FileNaming, RecorderSettings};
pub use models::error::CaptureError;
pub use models::media_models::{
    AudioLevels, AudioSource, CaptureDiagnostics, DisplayInfo, FrameGeometry, Resolution, VideoFrame,
};
pub use models::recording_result::{MediaOutput, RecordingMetadata, RecordingResult, TrackInfo};
pub use models::state::CaptureState;
pub use processing::sample_buffer::SampleBuffer;
pub use processing::sample_convert::SampleConverter;
pub use session::control::CaptureControl;
pub use session::recording::RecordingSession;
pub use storage::settings_store::SettingsStore;
pub use storage::wav_writer::WavFileWriter;
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::capture_provider::{AudioBufferCallback, AudioProvider};
pub use traits::capture_session::CaptureSession;
pub use traits::clock::{Clock, SystemClock};
pub use traits::frame_source::FrameSource;
pub use traits::video_encoder::VideoEncoder;
