use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::models::error::CaptureError;
use crate::models::media_models::{AudioLevels, CaptureDiagnostics};
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;
use crate::traits::capture_delegate::CaptureDelegate;

/// Mutable session state, protected by `parking_lot::Mutex`.
struct ControlState {
    state: CaptureState,
    levels: AudioLevels,
    capture_start: Option<Instant>,
    paused_duration: Duration,
    last_pause_time: Option<Instant>,
    /// Set by the first stop request; active time stops counting there.
    stopped_at: Option<Instant>,
    diagnostics: CaptureDiagnostics,
    error: Option<CaptureError>,
}

impl ControlState {
    fn new() -> Self {
        Self {
            state: CaptureState::Idle,
            levels: AudioLevels::default(),
            capture_start: None,
            paused_duration: Duration::ZERO,
            last_pause_time: None,
            stopped_at: None,
            diagnostics: CaptureDiagnostics::default(),
            error: None,
        }
    }

    /// Wall clock for duration accounting, frozen once a stop was requested.
    fn now(&self) -> Instant {
        self.stopped_at.unwrap_or_else(Instant::now)
    }

    /// Active time: wall time since start minus every pause, including an ongoing one.
    fn elapsed_at(&self, now: Instant) -> Duration {
        let Some(start) = self.capture_start else {
            return Duration::ZERO;
        };
        let ongoing_pause = self
            .last_pause_time
            .map(|paused_at| now.saturating_duration_since(paused_at))
            .unwrap_or_default();
        now.saturating_duration_since(start)
            .saturating_sub(self.paused_duration)
            .saturating_sub(ongoing_pause)
    }
}

/// The capture-control state holder shared by the session, both capture
/// loops, the audio callback and the timer thread.
///
/// Loops never spin on the flags: while paused they block on a condition
/// variable that is signalled on resume and on stop.
pub struct CaptureControl {
    inner: Mutex<ControlState>,
    wake: Condvar,
    stop_requested: AtomicBool,
    delegate: Mutex<Option<Arc<dyn CaptureDelegate>>>,
}

impl CaptureControl {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(ControlState::new()),
            wake: Condvar::new(),
            stop_requested: AtomicBool::new(false),
            delegate: Mutex::new(None),
        }
    }

    pub fn set_delegate(&self, delegate: Arc<dyn CaptureDelegate>) {
        *self.delegate.lock() = Some(delegate);
    }

    fn delegate(&self) -> Option<Arc<dyn CaptureDelegate>> {
        self.delegate.lock().clone()
    }

    pub fn state(&self) -> CaptureState {
        self.inner.lock().state.clone()
    }

    /// Replace the state and notify the delegate outside the lock.
    pub fn set_state(&self, new_state: CaptureState) {
        self.inner.lock().state = new_state.clone();
        self.wake.notify_all();
        if let Some(delegate) = self.delegate() {
            delegate.on_state_changed(&new_state);
        }
    }

    /// Reset the clocks and counters and enter `Recording`.
    pub fn begin(&self) {
        {
            let mut s = self.inner.lock();
            s.capture_start = Some(Instant::now());
            s.paused_duration = Duration::ZERO;
            s.last_pause_time = None;
            s.stopped_at = None;
            s.levels = AudioLevels::default();
            s.diagnostics = CaptureDiagnostics::default();
            s.error = None;
        }
        self.set_state(CaptureState::Recording { duration_secs: 0.0 });
    }

    /// Transitions: recording → paused.
    pub fn pause(&self) -> Result<f64, CaptureError> {
        let duration = {
            let mut s = self.inner.lock();
            if !s.state.is_recording() {
                return Err(CaptureError::InvalidState("can only pause while recording".into()));
            }
            let now = s.now();
            let duration = s.elapsed_at(now).as_secs_f64();
            s.last_pause_time = Some(now);
            duration
        };
        self.set_state(CaptureState::Paused { duration_secs: duration });
        Ok(duration)
    }

    /// Transitions: paused → recording. Wakes both loops.
    pub fn resume(&self) -> Result<f64, CaptureError> {
        let duration = {
            let mut s = self.inner.lock();
            if !s.state.is_paused() {
                return Err(CaptureError::InvalidState("can only resume while paused".into()));
            }
            let now = s.now();
            if let Some(paused_at) = s.last_pause_time.take() {
                s.paused_duration += now.saturating_duration_since(paused_at);
            }
            s.elapsed_at(now).as_secs_f64()
        };
        self.set_state(CaptureState::Recording { duration_secs: duration });
        Ok(duration)
    }

    /// Ask every loop to wind down and freeze the active duration. Idempotent.
    pub fn request_stop(&self) {
        let mut s = self.inner.lock();
        self.stop_requested.store(true, Ordering::SeqCst);
        if s.capture_start.is_some() && s.stopped_at.is_none() {
            s.stopped_at = Some(Instant::now());
        }
        self.wake.notify_all();
    }

    pub fn clear_stop(&self) {
        self.stop_requested.store(false, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    pub fn should_run(&self) -> bool {
        !self.stop_requested()
    }

    pub fn is_recording(&self) -> bool {
        self.inner.lock().state.is_recording()
    }

    pub fn is_paused(&self) -> bool {
        self.inner.lock().state.is_paused()
    }

    /// Block while paused, re-checking at least every `poll`.
    /// Returns `false` if a stop was requested.
    pub fn wait_while_paused(&self, poll: Duration) -> bool {
        let mut s = self.inner.lock();
        while s.state.is_paused() && !self.stop_requested() {
            self.wake.wait_for(&mut s, poll);
        }
        !self.stop_requested()
    }

    /// Sleep up to `timeout`, waking early on a stop request.
    /// Returns `true` if a stop was requested.
    pub fn wait_for_stop(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut s = self.inner.lock();
        while !self.stop_requested() {
            if self.wake.wait_until(&mut s, deadline).timed_out() {
                break;
            }
        }
        self.stop_requested()
    }

    /// Active recording time in seconds, pauses excluded.
    pub fn elapsed(&self) -> f64 {
        let s = self.inner.lock();
        s.elapsed_at(s.now()).as_secs_f64()
    }

    /// Refresh the duration carried by `Recording` and report it with the
    /// current levels. Returns the active duration.
    pub fn tick(&self) -> f64 {
        let (duration, levels, recording) = {
            let mut s = self.inner.lock();
            let duration = s.elapsed_at(s.now()).as_secs_f64();
            let recording = s.state.is_recording();
            if recording {
                s.state = CaptureState::Recording { duration_secs: duration };
            }
            (duration, s.levels, recording)
        };
        if recording {
            if let Some(delegate) = self.delegate() {
                delegate.on_levels_updated(&levels, duration);
            }
        }
        duration
    }

    /// Account for one device buffer. Returns `true` if the samples should be
    /// kept: the session is recording and no stop has been requested.
    pub fn on_audio_buffer(&self, frames: usize, levels: AudioLevels) -> bool {
        let mut s = self.inner.lock();
        s.levels = levels;
        s.diagnostics.audio_callback_count += 1;
        let accept = s.state.is_recording() && !self.stop_requested();
        if accept {
            s.diagnostics.audio_frames_received += frames as u64;
        } else {
            s.diagnostics.audio_frames_discarded += frames as u64;
        }
        accept
    }

    pub fn levels(&self) -> AudioLevels {
        self.inner.lock().levels
    }

    pub fn update_diagnostics(&self, update: impl FnOnce(&mut CaptureDiagnostics)) {
        update(&mut self.inner.lock().diagnostics);
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.inner.lock().diagnostics.clone()
    }

    /// Record a loop failure, report it, and stop the session.
    /// Only the first error is kept.
    pub fn record_error(&self, error: CaptureError) {
        log::error!("Capture loop failed: {}", error);
        {
            let mut s = self.inner.lock();
            if s.error.is_none() {
                s.error = Some(error.clone());
            }
        }
        if let Some(delegate) = self.delegate() {
            delegate.on_error(&error);
        }
        self.request_stop();
    }

    pub fn error(&self) -> Option<CaptureError> {
        self.inner.lock().error.clone()
    }

    pub(crate) fn notify_countdown(&self, remaining_secs: u32) {
        if let Some(delegate) = self.delegate() {
            delegate.on_countdown(remaining_secs);
        }
    }

    pub(crate) fn notify_finished(&self, result: &RecordingResult) {
        if let Some(delegate) = self.delegate() {
            delegate.on_capture_finished(result);
        }
    }

    /// Clear the clocks and the stop flag, then return to `Idle`.
    pub(crate) fn reset_to_idle(&self) {
        {
            let mut s = self.inner.lock();
            s.capture_start = None;
            s.last_pause_time = None;
            s.stopped_at = None;
            s.paused_duration = Duration::ZERO;
        }
        self.clear_stop();
        self.set_state(CaptureState::Idle);
    }
}

impl Default for CaptureControl {
    fn default() -> Self {
        Self::new()
    }
}
