use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Width × height of a video surface in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_even(&self) -> bool {
        self.width % 2 == 0 && self.height % 2 == 0
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = String;

    /// Parses `WIDTHxHEIGHT` (also accepts `X` and `*` as separator).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('*', "x");
        let (w, h) = normalized
            .split_once('x')
            .ok_or_else(|| format!("resolution must look like 1920x1080, got '{}'", s))?;
        let width = w
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid width '{}'", w.trim()))?;
        let height = h
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid height '{}'", h.trim()))?;
        if width == 0 || height == 0 {
            return Err("resolution dimensions must be non-zero".into());
        }
        Ok(Self { width, height })
    }
}

/// One screenshot as delivered by a `FrameSource`: tightly packed RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl VideoFrame {
    pub fn new(rgba: Vec<u8>, width: u32, height: u32) -> Self {
        Self { rgba, width, height }
    }

    /// Expected byte length for the frame's dimensions.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Geometry the video encoder is opened with. Fixed for the whole recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGeometry {
    /// Size of the raw frames fed to the encoder.
    pub input: Resolution,
    /// Size of the encoded output.
    pub output: Resolution,
    pub frame_rate: f64,
}

impl FrameGeometry {
    /// Bytes per raw BGR24 input frame.
    pub fn bgr_frame_len(&self) -> usize {
        self.input.width as usize * self.input.height as usize * 3
    }
}

/// A display that can be captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayInfo {
    pub id: u32,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub is_primary: bool,
}

/// An audio input device available for capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSource {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

/// Input level metering (RMS and peak, 0.0–1.0).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AudioLevels {
    pub level: f32,
    pub peak: f32,
}

/// Counters for debugging a recording session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureDiagnostics {
    pub frames_captured: u64,
    pub frames_written: u64,
    pub late_frames: u64,
    pub slow_writes: u64,
    pub audio_callback_count: u64,
    pub audio_frames_received: u64,
    pub audio_frames_discarded: u64,
    pub audio_blocks_written: u64,
    pub audio_bytes_written: u64,
}
