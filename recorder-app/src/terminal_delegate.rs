use std::io::{self, Write};

use parking_lot::Mutex;

use screen_recorder_core::{AudioLevels, CaptureDelegate, CaptureError, CaptureState, RecordingResult};

const METER_WIDTH: usize = 20;

/// Session delegate that renders a one-line status to the terminal.
///
/// Callbacks arrive on session worker threads; output goes through one lock
/// so lines never interleave.
#[derive(Default)]
pub struct TerminalDelegate {
    status_visible: Mutex<bool>,
}

impl TerminalDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print a full line, first clearing any status line that is showing.
    pub fn println(&self, message: &str) {
        let mut visible = self.status_visible.lock();
        let mut out = io::stdout().lock();
        if *visible {
            let _ = write!(out, "\r\x1b[2K");
            *visible = false;
        }
        let _ = writeln!(out, "{}", message);
        let _ = out.flush();
    }

    fn status(&self, line: &str) {
        let mut visible = self.status_visible.lock();
        let mut out = io::stdout().lock();
        let _ = write!(out, "\r\x1b[2K{}", line);
        let _ = out.flush();
        *visible = true;
    }
}

impl CaptureDelegate for TerminalDelegate {
    fn on_state_changed(&self, state: &CaptureState) {
        log::debug!("Session state: {}", state.name());
        if let CaptureState::Paused { duration_secs } = state {
            self.status(&status_line("PAUSED", *duration_secs, &AudioLevels::default()));
        }
    }

    fn on_countdown(&self, remaining_secs: u32) {
        self.println(&format!("Recording starts in {}...", remaining_secs));
    }

    fn on_levels_updated(&self, levels: &AudioLevels, duration_secs: f64) {
        self.status(&status_line("REC", duration_secs, levels));
    }

    fn on_error(&self, error: &CaptureError) {
        self.println(&format!("Error: {}", error));
    }

    fn on_capture_finished(&self, result: &RecordingResult) {
        self.println(&summary(result));
    }
}

/// `● REC 00:01:05 [######              ]`
pub fn status_line(label: &str, duration_secs: f64, levels: &AudioLevels) -> String {
    format!(
        "● {} {} [{}]",
        label,
        format_duration(duration_secs),
        level_meter(levels.level, METER_WIDTH)
    )
}

pub fn format_duration(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    format!("{:02}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}

pub fn level_meter(level: f32, width: usize) -> String {
    let filled = ((level.clamp(0.0, 1.0) * width as f32).round() as usize).min(width);
    format!("{}{}", "#".repeat(filled), " ".repeat(width - filled))
}

/// What was written and where.
pub fn summary(result: &RecordingResult) -> String {
    let mut lines = vec![format!("Recorded {}", format_duration(result.duration_secs))];
    if let Some(video) = &result.video {
        lines.push(format!("  video: {} ({} bytes)", video.file_path.display(), video.size_bytes));
    }
    if let Some(audio) = &result.audio {
        lines.push(format!("  audio: {} ({} bytes)", audio.file_path.display(), audio.size_bytes));
    }
    lines.join("\n")
}
