use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::media_models::Resolution;

pub const DEFAULT_AUDIO_SAMPLE_RATE: u32 = 44_100;
pub const FALLBACK_AUDIO_SAMPLE_RATE: u32 = 22_050;
pub const DEFAULT_VIDEO_RESOLUTION: Resolution = Resolution::new(1920, 1080);
pub const DEFAULT_FRAME_RATE: f64 = 20.0;
pub const DEFAULT_BASE_NAME: &str = "Recording";

pub const MAX_FRAME_RATE: f64 = 120.0;
pub const MIN_SAMPLE_RATE: u32 = 8_000;
pub const MAX_SAMPLE_RATE: u32 = 192_000;
const MAX_BLOCK_SECS: f64 = 10.0;

/// How output files are named inside the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileNaming {
    /// `Recording.avi` / `Recording.wav`, overwritten by every recording.
    #[default]
    Fixed,
    /// `Recording_20240131_154501.avi`, one pair per recording.
    Timestamped,
}

/// Settings for a recording session.
///
/// Persisted as JSON by the settings store; every field has a default so
/// older settings files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderSettings {
    /// Directory where recording files are written.
    pub output_directory: PathBuf,

    /// Sample rate of the WAV file in Hz (default: 44100).
    pub audio_sample_rate: u32,

    /// Rate to request from the device when it rejects `audio_sample_rate`.
    pub fallback_sample_rate: u32,

    /// Channels in the WAV file (default: 2).
    pub audio_channels: u16,

    /// PCM bit depth of the WAV file. Only 16 is supported.
    pub bit_depth: u16,

    /// Duration of one audio block in seconds (default: 1.0).
    pub audio_block_secs: f64,

    /// Encoded video size; captured frames are scaled to it.
    pub video_resolution: Resolution,

    /// Video frames per second (default: 20).
    pub frame_rate: f64,

    /// Seconds of countdown before capture begins. 0 disables it.
    pub countdown_secs: u32,

    pub enable_video: bool,
    pub enable_audio: bool,

    pub file_naming: FileNaming,
    pub base_name: String,

    /// Stop automatically after this much active (unpaused) time.
    pub max_duration_secs: Option<f64>,

    /// Display to capture, or None for the primary display.
    pub display_id: Option<u32>,

    /// Audio input device name, or None for the system default.
    pub audio_device: Option<String>,
}

impl RecorderSettings {
    pub fn validate(&self) -> Result<(), String> {
        for rate in [self.audio_sample_rate, self.fallback_sample_rate] {
            if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&rate) {
                return Err(format!(
                    "sample rate {} Hz is outside {}..={} Hz",
                    rate, MIN_SAMPLE_RATE, MAX_SAMPLE_RATE
                ));
            }
        }
        if ![1, 2].contains(&self.audio_channels) {
            return Err(format!("unsupported channel count: {}", self.audio_channels));
        }
        if self.bit_depth != 16 {
            return Err(format!("unsupported bit depth: {}", self.bit_depth));
        }
        if !(self.audio_block_secs > 0.0 && self.audio_block_secs <= MAX_BLOCK_SECS) {
            return Err(format!("audio block duration out of range: {}", self.audio_block_secs));
        }
        if !(self.frame_rate > 0.0 && self.frame_rate <= MAX_FRAME_RATE) {
            return Err(format!("frame rate out of range: {}", self.frame_rate));
        }
        if self.video_resolution.width == 0 || self.video_resolution.height == 0 {
            return Err("video resolution must be non-zero".into());
        }
        if !self.video_resolution.is_even() {
            return Err(format!(
                "video resolution must have even dimensions: {}",
                self.video_resolution
            ));
        }
        if !self.enable_video && !self.enable_audio {
            return Err("at least one of video or audio capture must be enabled".into());
        }
        if let Some(max) = self.max_duration_secs {
            if !(max.is_finite() && max > 0.0) {
                return Err("maximum duration must be positive".into());
            }
        }
        if self.base_name.trim().is_empty() {
            return Err("base file name must not be empty".into());
        }
        Ok(())
    }

    /// Number of audio frames in one fixed-duration block.
    pub fn block_frames(&self) -> usize {
        ((self.audio_sample_rate as f64 * self.audio_block_secs).round() as usize).max(1)
    }
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("."),
            audio_sample_rate: DEFAULT_AUDIO_SAMPLE_RATE,
            fallback_sample_rate: FALLBACK_AUDIO_SAMPLE_RATE,
            audio_channels: 2,
            bit_depth: 16,
            audio_block_secs: 1.0,
            video_resolution: DEFAULT_VIDEO_RESOLUTION,
            frame_rate: DEFAULT_FRAME_RATE,
            countdown_secs: 3,
            enable_video: true,
            enable_audio: true,
            file_naming: FileNaming::Fixed,
            base_name: DEFAULT_BASE_NAME.to_string(),
            max_duration_secs: None,
            display_id: None,
            audio_device: None,
        }
    }
}
