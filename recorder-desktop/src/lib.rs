//! # screen-recorder-desktop
//!
//! Desktop backends for screen-recorder.
//!
//! Provides:
//! - `XcapFrameSource`: full-monitor screenshots via `xcap`
//! - `CpalAudioProvider`: microphone / line-in capture via `cpal`
//! - `FfmpegVideoEncoder`: raw BGR24 frames piped into an `ffmpeg` child process
//! - `DeviceEnumerator`: display and audio input listing
//! - `permissions`: screen capture and microphone access checks
//!
//! ## Runtime Requirements
//! - `ffmpeg` on `PATH` (or `FFMPEG_PATH`) for video
//! - On Linux, an X11 or Wayland session `xcap` can capture from
//!
//! ## Usage
//! ```ignore
//! use screen_recorder_core::RecordingSession;
//! use screen_recorder_desktop::{CpalAudioProvider, FfmpegVideoEncoder, XcapFrameSource};
//!
//! let screen = XcapFrameSource::new(None);
//! let audio = CpalAudioProvider::new(None, 44_100, 22_050);
//! let encoder = FfmpegVideoEncoder::new()?;
//! let mut session = RecordingSession::new(screen, audio, encoder);
//! ```

pub mod cpal_input;
pub mod device_enumerator;
pub mod ffmpeg_encoder;
pub mod permissions;
pub mod screen_capture;

pub use cpal_input::CpalAudioProvider;
pub use device_enumerator::DeviceEnumerator;
pub use ffmpeg_encoder::FfmpegVideoEncoder;
pub use permissions::PermissionStatus;
pub use screen_capture::XcapFrameSource;
