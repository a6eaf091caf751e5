use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;

use screen_recorder_core::{CaptureError, RecorderSettings, RecordingResult, RecordingSession};
use screen_recorder_desktop::permissions;
use screen_recorder_desktop::{CpalAudioProvider, FfmpegVideoEncoder, XcapFrameSource};

use crate::interrupt::Interrupt;
use crate::terminal_delegate::TerminalDelegate;

pub type DesktopSession = RecordingSession<XcapFrameSource, CpalAudioProvider, FfmpegVideoEncoder>;

const WAIT_INTERVAL: Duration = Duration::from_millis(100);

/// Wire the desktop backends into a configured session.
pub fn build_session(settings: &RecorderSettings, delegate: Arc<TerminalDelegate>) -> anyhow::Result<DesktopSession> {
    let encoder = match FfmpegVideoEncoder::new() {
        Ok(encoder) => encoder,
        Err(e) if settings.enable_video => return Err(e).context("video recording needs ffmpeg"),
        // Never opened when video is off.
        Err(_) => FfmpegVideoEncoder::with_binary(PathBuf::from("ffmpeg")),
    };
    log::debug!("Using ffmpeg at {:?}", encoder.binary());

    let screen = XcapFrameSource::new(settings.display_id);
    let audio = CpalAudioProvider::new(
        settings.audio_device.clone(),
        settings.audio_sample_rate,
        settings.fallback_sample_rate,
    );

    let mut session = RecordingSession::new(screen, audio, encoder);
    session.set_delegate(delegate);
    session
        .configure(settings.clone())
        .context("invalid recording settings")?;
    Ok(session)
}

/// Check the enabled captures before starting. Fails only when none of
/// them is usable.
pub fn check_permissions(settings: &RecorderSettings) -> Result<(), CaptureError> {
    let mut statuses = Vec::new();
    if settings.enable_video {
        statuses.push(permissions::check_screen_capture_permission());
    }
    if settings.enable_audio {
        statuses.push(permissions::check_microphone_permission(settings.audio_device.as_deref()));
    }
    for status in statuses.iter().filter(|s| !s.is_granted()) {
        log::warn!("Capture check: {:?}", status);
    }
    permissions::require_any(&statuses)
}

/// Record until `max_duration_secs` runs out, a capture loop asks to stop,
/// or Ctrl-C. `None` if Ctrl-C cancelled the countdown.
pub fn record_unattended(settings: &RecorderSettings, interrupt: &Interrupt) -> anyhow::Result<Option<RecordingResult>> {
    let delegate = Arc::new(TerminalDelegate::new());
    let mut session = build_session(settings, delegate)?;
    interrupt.watch(session.control());

    check_permissions(settings).context("cannot record")?;
    if interrupt.is_set() {
        return Ok(None);
    }
    match session.start_capture() {
        Ok(()) => {}
        Err(CaptureError::Cancelled) if interrupt.is_set() => return Ok(None),
        Err(e) => return Err(e).context("failed to start recording"),
    }
    while !session.stop_requested() {
        thread::sleep(WAIT_INTERVAL);
    }
    session.stop_capture().map(Some).context("recording failed")
}
