//! Video encoder that pipes raw frames into an `ffmpeg` child process.
//!
//! ffmpeg reads packed `bgr24` frames on stdin at the recording frame rate,
//! scales them to the configured resolution and writes an AVI with MPEG-4
//! Part 2 video tagged `XVID`.

use std::env;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::{self, JoinHandle};

use screen_recorder_core::models::config::RecorderSettings;
use screen_recorder_core::models::error::CaptureError;
use screen_recorder_core::models::media_models::FrameGeometry;
use screen_recorder_core::traits::video_encoder::VideoEncoder;

/// Environment variable overriding the ffmpeg binary.
pub const FFMPEG_PATH_ENV: &str = "FFMPEG_PATH";

/// ffmpeg's `-q:v` for mpeg4: 1 (best) to 31 (worst).
const VIDEO_QUALITY: u8 = 5;
const STDIN_BUFFER: usize = 8 * 1024 * 1024;

pub struct FfmpegVideoEncoder {
    ffmpeg: PathBuf,
    process: Option<Child>,
    writer: Option<BufWriter<ChildStdin>>,
    stderr_reader: Option<JoinHandle<String>>,
    frame_len: usize,
    frames_written: u64,
}

impl FfmpegVideoEncoder {
    /// Use the ffmpeg found by [`find_ffmpeg`].
    pub fn new() -> Result<Self, CaptureError> {
        let ffmpeg = find_ffmpeg().ok_or_else(|| {
            CaptureError::EncodingFailed(format!(
                "ffmpeg not found in PATH; install it or set {}",
                FFMPEG_PATH_ENV
            ))
        })?;
        Ok(Self::with_binary(ffmpeg))
    }

    pub fn with_binary(ffmpeg: PathBuf) -> Self {
        Self {
            ffmpeg,
            process: None,
            writer: None,
            stderr_reader: None,
            frame_len: 0,
            frames_written: 0,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.ffmpeg
    }

    fn collect_stderr(&mut self) -> String {
        self.stderr_reader
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default()
    }
}

impl VideoEncoder for FfmpegVideoEncoder {
    fn open(&mut self, path: &Path, geometry: FrameGeometry, _settings: &RecorderSettings) -> Result<(), CaptureError> {
        if self.process.is_some() {
            return Err(CaptureError::InvalidState("encoder already open".into()));
        }

        let args = build_ffmpeg_args(&geometry, path);
        log::debug!("Starting {:?} {}", self.ffmpeg, args.join(" "));

        let mut process = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CaptureError::EncodingFailed(format!("failed to start {}: {}", self.ffmpeg.display(), e)))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| CaptureError::EncodingFailed("failed to open ffmpeg stdin".into()))?;

        // ffmpeg blocks if nobody drains stderr.
        self.stderr_reader = process.stderr.take().and_then(|mut stderr| {
            thread::Builder::new()
                .name("ffmpeg-stderr".into())
                .spawn(move || {
                    let mut output = String::new();
                    let _ = stderr.read_to_string(&mut output);
                    output
                })
                .ok()
        });

        self.writer = Some(BufWriter::with_capacity(STDIN_BUFFER, stdin));
        self.process = Some(process);
        self.frame_len = geometry.bgr_frame_len();
        self.frames_written = 0;
        Ok(())
    }

    fn write_frame(&mut self, bgr: &[u8]) -> Result<(), CaptureError> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| CaptureError::EncodingFailed("encoder is not open".into()))?;
        if bgr.len() != self.frame_len {
            return Err(CaptureError::EncodingFailed(format!(
                "frame is {} bytes, expected {}",
                bgr.len(),
                self.frame_len
            )));
        }
        writer
            .write_all(bgr)
            .map_err(|e| CaptureError::EncodingFailed(format!("ffmpeg stopped accepting frames: {}", e)))?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), CaptureError> {
        let flushed = match self.writer.take() {
            Some(mut writer) => writer.flush(),
            None => Ok(()),
        };

        let Some(mut process) = self.process.take() else {
            return Ok(());
        };
        let status = process
            .wait()
            .map_err(|e| CaptureError::EncodingFailed(format!("failed to wait for ffmpeg: {}", e)))?;
        let stderr = self.collect_stderr();

        if !status.success() {
            return Err(CaptureError::EncodingFailed(format!(
                "ffmpeg exited with {}: {}",
                status,
                stderr.trim()
            )));
        }
        flushed.map_err(|e| CaptureError::EncodingFailed(format!("failed to flush frames: {}", e)))?;
        log::info!("Video finalized: {} frames", self.frames_written);
        Ok(())
    }

    fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl Drop for FfmpegVideoEncoder {
    fn drop(&mut self) {
        self.writer.take();
        if let Some(mut process) = self.process.take() {
            log::warn!("ffmpeg still running on drop, killing it");
            let _ = process.kill();
            let _ = process.wait();
        }
    }
}

/// Command line for encoding raw `bgr24` from stdin into `output`.
pub fn build_ffmpeg_args(geometry: &FrameGeometry, output: &Path) -> Vec<String> {
    let mut args: Vec<String> = [
        "-y",
        "-hide_banner",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pixel_format",
        "bgr24",
        "-video_size",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    args.extend([
        geometry.input.to_string(),
        "-framerate".to_string(),
        format_frame_rate(geometry.frame_rate),
        "-i".to_string(),
        "-".to_string(),
    ]);

    if geometry.output != geometry.input {
        args.extend([
            "-vf".to_string(),
            format!("scale={}:{}", geometry.output.width, geometry.output.height),
        ]);
    }

    args.extend([
        "-c:v".to_string(),
        "mpeg4".to_string(),
        "-vtag".to_string(),
        "xvid".to_string(),
        "-q:v".to_string(),
        VIDEO_QUALITY.to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        output.to_string_lossy().into_owned(),
    ]);
    args
}

fn format_frame_rate(frame_rate: f64) -> String {
    if frame_rate.fract() == 0.0 {
        format!("{}", frame_rate as u64)
    } else {
        format!("{}", frame_rate)
    }
}

/// `$FFMPEG_PATH` if set, else the first `ffmpeg` on `PATH`.
pub fn find_ffmpeg() -> Option<PathBuf> {
    if let Some(path) = env::var_os(FFMPEG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Some(path);
        }
        log::warn!("{} points to {:?}, which is not a file", FFMPEG_PATH_ENV, path);
    }

    let name = if cfg!(windows) { "ffmpeg.exe" } else { "ffmpeg" };
    env::var_os("PATH").and_then(|paths| {
        env::split_paths(&paths)
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}
